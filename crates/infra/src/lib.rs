//! `epitrack-infra` — persistence, orchestration, and read-side services.
//!
//! The domain crates stay pure; this crate owns the transactional store, the
//! process engine, the registry services, the audit side channel, and the
//! reporting queries.

pub mod audit;
pub mod engine;
pub mod registry_service;
pub mod reports;
pub mod store;


pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use engine::{
    AdminProcessQuery, CreateProcess, ProcessEngine, ProcessItemView, ProcessPatch, ProcessQuery,
    ProcessView,
};
pub use registry_service::{CollaboratorPatch, ItemPatch, RegistryService};
pub use reports::{DashboardSummary, FinancialSummary, dashboard, financial};
pub use store::{InMemoryStore, Store, StoreError, StoreState};
