use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epitrack_core::{CollaboratorId, DomainError, ItemId, ProcessId, TenantId};

/// One issuance lifecycle record.
///
/// Invariants:
/// - `delivery_confirmed == true` iff `delivered_at` is set.
/// - `returned_at` may only be set once delivery has been confirmed, and at
///   most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    pub tenant_id: TenantId,
    pub collaborator_id: CollaboratorId,
    pub scheduled_date: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub delivery_confirmed: bool,
    pub notes: Option<String>,
    /// Generated document reference (e.g. a signed issuance form).
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a process (item list handled separately, see
/// [`crate::reservation`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProcess {
    pub collaborator_id: CollaboratorId,
    pub scheduled_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Association: which item, how much, per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessItem {
    pub process_id: ProcessId,
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Derived lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Pending,
    Delivered,
    Returned,
}

impl Process {
    pub fn create(tenant_id: TenantId, new: NewProcess) -> Self {
        Self {
            id: ProcessId::new(),
            tenant_id,
            collaborator_id: new.collaborator_id,
            scheduled_date: new.scheduled_date,
            delivered_at: None,
            returned_at: None,
            delivery_confirmed: false,
            notes: new.notes,
            document_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> ProcessStatus {
        if self.returned_at.is_some() {
            ProcessStatus::Returned
        } else if self.delivery_confirmed {
            ProcessStatus::Delivered
        } else {
            ProcessStatus::Pending
        }
    }

    /// Confirm delivery.
    ///
    /// Sets the confirmed flag together with the timestamp (now when absent),
    /// keeping the flag/timestamp invariant. No stock change: stock was
    /// already debited at creation.
    pub fn confirm_delivery(
        &mut self,
        at: Option<DateTime<Utc>>,
        document_url: Option<String>,
    ) -> Result<(), DomainError> {
        if self.delivery_confirmed {
            return Err(DomainError::invalid_transition("already delivered"));
        }
        self.delivery_confirmed = true;
        self.delivered_at = Some(at.unwrap_or_else(Utc::now));
        if document_url.is_some() {
            self.document_url = document_url;
        }
        Ok(())
    }

    /// Register the return of all issued items.
    ///
    /// Only delivered processes can be returned, and only once. The stock
    /// credit is the caller's transactional concern.
    pub fn register_return(
        &mut self,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), DomainError> {
        if !self.delivery_confirmed {
            return Err(DomainError::invalid_transition("not yet delivered"));
        }
        if self.returned_at.is_some() {
            return Err(DomainError::invalid_transition("already returned"));
        }
        self.returned_at = Some(at);
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }
}

/// Listing filter over the delivery flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Delivered,
}

impl StatusFilter {
    pub fn matches(&self, process: &Process) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !process.delivery_confirmed,
            StatusFilter::Delivered => process.delivery_confirmed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = DomainError;

    /// Wire values kept from the original API ("todos", "pendentes",
    /// "entregues").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todos" => Ok(StatusFilter::All),
            "pendentes" => Ok(StatusFilter::Pending),
            "entregues" => Ok(StatusFilter::Delivered),
            other => Err(DomainError::validation(format!(
                "status must be one of todos, pendentes, entregues (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending_process() -> Process {
        Process::create(
            TenantId::new(),
            NewProcess {
                collaborator_id: CollaboratorId::new(),
                scheduled_date: Utc::now(),
                notes: None,
            },
        )
    }

    #[test]
    fn fresh_process_is_pending() {
        let p = pending_process();
        assert_eq!(p.status(), ProcessStatus::Pending);
        assert!(!p.delivery_confirmed);
        assert!(p.delivered_at.is_none());
    }

    #[test]
    fn confirm_delivery_sets_flag_and_timestamp_together() {
        let mut p = pending_process();
        let before = Utc::now();
        p.confirm_delivery(None, None).unwrap();
        let after = Utc::now();

        assert!(p.delivery_confirmed);
        let at = p.delivered_at.unwrap();
        assert!(at >= before && at <= after);
        assert_eq!(p.status(), ProcessStatus::Delivered);
    }

    #[test]
    fn confirm_delivery_twice_fails_and_keeps_first_timestamp() {
        let mut p = pending_process();
        let first = Utc::now() - Duration::hours(1);
        p.confirm_delivery(Some(first), None).unwrap();

        let err = p.confirm_delivery(Some(Utc::now()), None).unwrap_err();
        assert_eq!(err, DomainError::invalid_transition("already delivered"));
        assert_eq!(p.delivered_at, Some(first));
    }

    #[test]
    fn confirm_delivery_stores_document_url() {
        let mut p = pending_process();
        p.confirm_delivery(None, Some("https://docs.example/term.pdf".into()))
            .unwrap();
        assert_eq!(
            p.document_url.as_deref(),
            Some("https://docs.example/term.pdf")
        );
    }

    #[test]
    fn return_before_delivery_fails() {
        let mut p = pending_process();
        let err = p.register_return(Utc::now(), None).unwrap_err();
        assert_eq!(err, DomainError::invalid_transition("not yet delivered"));
    }

    #[test]
    fn return_twice_fails() {
        let mut p = pending_process();
        p.confirm_delivery(None, None).unwrap();
        p.register_return(Utc::now(), None).unwrap();
        assert_eq!(p.status(), ProcessStatus::Returned);

        let err = p.register_return(Utc::now(), None).unwrap_err();
        assert_eq!(err, DomainError::invalid_transition("already returned"));
    }

    #[test]
    fn status_filter_parses_wire_values() {
        assert_eq!("todos".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "pendentes".parse::<StatusFilter>().unwrap(),
            StatusFilter::Pending
        );
        assert_eq!(
            "entregues".parse::<StatusFilter>().unwrap(),
            StatusFilter::Delivered
        );
        assert!("anything".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn status_filter_pending_excludes_delivered() {
        let mut p = pending_process();
        assert!(StatusFilter::Pending.matches(&p));
        p.confirm_delivery(None, None).unwrap();
        assert!(!StatusFilter::Pending.matches(&p));
        assert!(StatusFilter::Delivered.matches(&p));
        assert!(StatusFilter::All.matches(&p));
    }
}
