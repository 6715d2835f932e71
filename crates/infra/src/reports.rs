//! Read-only reporting aggregations over the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epitrack_core::TenantId;
use epitrack_process::ProcessStatus;

use crate::store::{Store, StoreError};

/// Per-tenant operational snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub processes_total: usize,
    pub processes_pending: usize,
    pub processes_delivered: usize,
    pub processes_returned: usize,
    pub items_total: usize,
    pub items_below_minimum: usize,
    pub collaborators_active: usize,
}

/// Per-tenant monetary summary, in integer cents.
///
/// `issued` covers every process in range; `returned` the subset already
/// returned; `outstanding` the delivered-but-not-returned remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub issued_cents: i64,
    pub returned_cents: i64,
    pub outstanding_cents: i64,
    pub processes_counted: usize,
}

pub fn dashboard<S: Store>(
    store: &S,
    tenant_id: TenantId,
) -> Result<DashboardSummary, StoreError> {
    store.read(|state| {
        let mut summary = DashboardSummary {
            processes_total: 0,
            processes_pending: 0,
            processes_delivered: 0,
            processes_returned: 0,
            items_total: 0,
            items_below_minimum: 0,
            collaborators_active: 0,
        };

        for process in state.processes.values().filter(|p| p.tenant_id == tenant_id) {
            summary.processes_total += 1;
            match process.status() {
                ProcessStatus::Pending => summary.processes_pending += 1,
                ProcessStatus::Delivered => summary.processes_delivered += 1,
                ProcessStatus::Returned => summary.processes_returned += 1,
            }
        }
        for item in state.items.values().filter(|i| i.tenant_id == tenant_id) {
            summary.items_total += 1;
            if item.is_below_minimum() {
                summary.items_below_minimum += 1;
            }
        }
        summary.collaborators_active = state
            .collaborators
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.active)
            .count();

        Ok(summary)
    })
}

pub fn financial<S: Store>(
    store: &S,
    tenant_id: TenantId,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<FinancialSummary, StoreError> {
    store.read(|state| {
        let mut summary = FinancialSummary {
            issued_cents: 0,
            returned_cents: 0,
            outstanding_cents: 0,
            processes_counted: 0,
        };

        let in_range = state
            .processes
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .filter(|p| from.is_none_or(|f| p.scheduled_date >= f))
            .filter(|p| to.is_none_or(|t| p.scheduled_date <= t));

        for process in in_range {
            summary.processes_counted += 1;
            let mut value = 0i64;
            for row in state.process_items.get(&process.id).into_iter().flatten() {
                // Items referenced by a process cannot be deleted, so the
                // lookup only misses for foreign rows, which do not exist.
                if let Ok(item) = state.item_in(tenant_id, row.item_id) {
                    value += i64::from(row.quantity) * item.unit_price;
                }
            }
            summary.issued_cents += value;
            match process.status() {
                ProcessStatus::Returned => summary.returned_cents += value,
                ProcessStatus::Delivered => summary.outstanding_cents += value,
                ProcessStatus::Pending => {}
            }
        }

        Ok(summary)
    })
}
