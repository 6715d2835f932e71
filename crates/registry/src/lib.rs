//! `epitrack-registry` — tenant (company) and workforce (collaborator) records.

pub mod collaborator;
pub mod company;

pub use collaborator::{Collaborator, NewCollaborator};
pub use company::Company;
