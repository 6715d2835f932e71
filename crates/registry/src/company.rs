use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use epitrack_core::{DomainError, TenantId};

/// A tenant: the company owning its collaborators, items, and processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: TenantId,
    pub name: String,
    /// Opaque key for machine-to-machine integrations.
    pub api_key: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn create(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("company name cannot be empty"));
        }
        Ok(Self {
            id: TenantId::new(),
            name,
            api_key: Uuid::new_v4().simple().to_string(),
            active: true,
            created_at: Utc::now(),
        })
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
