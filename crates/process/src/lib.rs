//! `epitrack-process` — the issuance process lifecycle.
//!
//! A process links one collaborator to one or more reserved items. Stock is
//! debited when the process is created and credited back when the process is
//! deleted or its items are returned. The transitions here are pure; the
//! transactional orchestration lives in `epitrack-infra`.

pub mod process;
pub mod reservation;

pub use process::{NewProcess, Process, ProcessItem, ProcessStatus, StatusFilter};
pub use reservation::{Reservation, ReservationChange, normalize, reconcile};
