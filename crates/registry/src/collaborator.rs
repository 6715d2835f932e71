use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epitrack_core::{CollaboratorId, DomainError, TenantId};

/// A workforce member eligible to receive equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: CollaboratorId,
    pub tenant_id: TenantId,
    pub name: String,
    /// National identity document. Unique per tenant.
    pub national_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCollaborator {
    pub name: String,
    pub national_id: String,
}

impl Collaborator {
    pub fn create(tenant_id: TenantId, new: NewCollaborator) -> Result<Self, DomainError> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("collaborator name cannot be empty"));
        }
        if new.national_id.trim().is_empty() {
            return Err(DomainError::validation("national_id cannot be empty"));
        }
        Ok(Self {
            id: CollaboratorId::new(),
            tenant_id,
            name: new.name,
            national_id: new.national_id,
            active: true,
            created_at: Utc::now(),
        })
    }

    /// Invariant helper: only active collaborators may receive equipment.
    pub fn can_receive(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_collaborator() -> Collaborator {
        Collaborator::create(
            TenantId::new(),
            NewCollaborator {
                name: "Maria Souza".to_string(),
                national_id: "123.456.789-00".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn fresh_collaborator_can_receive() {
        assert!(new_collaborator().can_receive());
    }

    #[test]
    fn deactivated_collaborator_cannot_receive() {
        let mut c = new_collaborator();
        c.deactivate();
        assert!(!c.can_receive());
    }

    #[test]
    fn create_rejects_blank_national_id() {
        let res = Collaborator::create(
            TenantId::new(),
            NewCollaborator {
                name: "Maria Souza".to_string(),
                national_id: "".to_string(),
            },
        );
        assert!(matches!(res, Err(DomainError::Validation(_))));
    }
}
