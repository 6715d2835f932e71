//! Process engine: the issuance lifecycle orchestrated against the store.
//!
//! Every multi-entity mutation (create, update, delete, return) runs inside
//! one store transaction, so the stock check-then-debit sequence either
//! commits whole or not at all. Audit events are recorded after commit,
//! through the fire-and-forget sink.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epitrack_core::{CollaboratorId, DomainError, ItemId, Page, Pagination, ProcessId, TenantId};
use epitrack_process::{
    NewProcess, Process, ProcessItem, Reservation, StatusFilter, normalize, reconcile,
};

use crate::audit::{AuditEvent, AuditSink};
use crate::store::{Store, StoreError, StoreState};

/// Input for creating a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProcess {
    pub collaborator_id: CollaboratorId,
    pub scheduled_date: DateTime<Utc>,
    pub items: Vec<Reservation>,
    pub notes: Option<String>,
}

/// Partial update. `items`, when present, replaces the whole reservation
/// list; absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessPatch {
    pub collaborator_id: Option<CollaboratorId>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub items: Option<Vec<Reservation>>,
    pub notes: Option<String>,
    pub delivery_confirmed: Option<bool>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub document_url: Option<String>,
}

/// Listing parameters shared by all process listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessQuery {
    pub pagination: Pagination,
    pub status: StatusFilter,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
}

/// Admin listing: unrestricted across tenants, plus free-text search over
/// collaborator name, collaborator national id, and company name.
#[derive(Debug, Clone, Default)]
pub struct AdminProcessQuery {
    pub query: ProcessQuery,
    pub search: Option<String>,
}

/// Item details hydrated into a process view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessItemView {
    pub item_id: ItemId,
    pub name: String,
    pub certificate: String,
    pub quantity: u32,
    /// Unit price in integer cents.
    pub unit_price: i64,
}

/// Fully hydrated process: record + collaborator, company, and item details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessView {
    pub process: Process,
    pub collaborator_name: String,
    pub collaborator_national_id: String,
    pub company_name: String,
    pub items: Vec<ProcessItemView>,
}

fn hydrate(state: &StoreState, process: &Process) -> Result<ProcessView, DomainError> {
    let company = state.company(process.tenant_id)?;
    let collaborator = state.collaborator_in(process.tenant_id, process.collaborator_id)?;

    let mut items = Vec::new();
    for row in state.process_items.get(&process.id).into_iter().flatten() {
        let item = state.item_in(process.tenant_id, row.item_id)?;
        items.push(ProcessItemView {
            item_id: item.id,
            name: item.name.clone(),
            certificate: item.certificate.clone(),
            quantity: row.quantity,
            unit_price: item.unit_price,
        });
    }

    Ok(ProcessView {
        process: process.clone(),
        collaborator_name: collaborator.name.clone(),
        collaborator_national_id: collaborator.national_id.clone(),
        company_name: company.name.clone(),
        items,
    })
}

/// The issuance lifecycle engine.
///
/// Generic over the store so tests can substitute implementations; the audit
/// sink is a trait object because recording is fire-and-forget.
pub struct ProcessEngine<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
}

impl<S> ProcessEngine<S>
where
    S: Store,
{
    pub fn new(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Create a process: one record, one association per requested item, and
    /// one stock debit per item, committed together.
    pub fn create_process(
        &self,
        tenant_id: TenantId,
        input: CreateProcess,
    ) -> Result<ProcessView, StoreError> {
        let requested = normalize(input.items)?;

        let view = self.store.transact(|state| {
            state.company(tenant_id)?;
            let collaborator = state.collaborator_in(tenant_id, input.collaborator_id)?;
            if !collaborator.can_receive() {
                return Err(DomainError::validation("collaborator is not active"));
            }

            for r in &requested {
                state.item_in_mut(tenant_id, r.item_id)?.debit(r.quantity)?;
            }

            let process = Process::create(
                tenant_id,
                NewProcess {
                    collaborator_id: input.collaborator_id,
                    scheduled_date: input.scheduled_date,
                    notes: input.notes.clone(),
                },
            );
            state.process_items.insert(
                process.id,
                requested
                    .iter()
                    .map(|r| ProcessItem {
                        process_id: process.id,
                        item_id: r.item_id,
                        quantity: r.quantity,
                    })
                    .collect(),
            );
            state.processes.insert(process.id, process.clone());

            hydrate(state, &process)
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "process",
            view.process.id,
            "created",
            serde_json::json!({
                "collaborator_id": view.process.collaborator_id,
                "items": view.items.len(),
            }),
        ));
        Ok(view)
    }

    /// Partial update. Replacing the item list is reconciled as a net
    /// per-item delta: the old reservation is restored, the new quantity is
    /// validated against the restored on-hand, and the difference is applied,
    /// all inside the same transaction.
    pub fn update_process(
        &self,
        tenant_id: TenantId,
        process_id: ProcessId,
        patch: ProcessPatch,
    ) -> Result<ProcessView, StoreError> {
        let new_items = patch.items.clone().map(normalize).transpose()?;

        let view = self.store.transact(|state| {
            let mut process = state.process_in(tenant_id, process_id)?.clone();

            if let Some(new) = &new_items {
                // The reconcile math assumes the old reservations are still
                // debited, which stops being true once the return credited
                // them back.
                if process.returned_at.is_some() {
                    return Err(DomainError::invalid_transition("already returned"));
                }
                let old = state.reservations(process_id);
                for change in reconcile(&old, new) {
                    let item = state.item_in_mut(tenant_id, change.item_id)?;
                    let restored = item.on_hand + change.previous;
                    if change.requested > restored {
                        return Err(DomainError::insufficient_stock(restored, change.requested));
                    }
                    item.on_hand = restored - change.requested;
                }
                state.process_items.insert(
                    process_id,
                    new.iter()
                        .map(|r| ProcessItem {
                            process_id,
                            item_id: r.item_id,
                            quantity: r.quantity,
                        })
                        .collect(),
                );
            }

            if let Some(collaborator_id) = patch.collaborator_id {
                let collaborator = state.collaborator_in(tenant_id, collaborator_id)?;
                if !collaborator.can_receive() {
                    return Err(DomainError::validation("collaborator is not active"));
                }
                process.collaborator_id = collaborator_id;
            }
            if let Some(scheduled) = patch.scheduled_date {
                process.scheduled_date = scheduled;
            }
            if patch.notes.is_some() {
                process.notes = patch.notes.clone();
            }

            // Delivery fields move together to keep the flag/timestamp invariant.
            match patch.delivery_confirmed {
                Some(true) => {
                    process.delivery_confirmed = true;
                    process.delivered_at = patch
                        .delivered_at
                        .or(process.delivered_at)
                        .or_else(|| Some(Utc::now()));
                }
                Some(false) => {
                    // A returned process cannot go back to undelivered:
                    // `returned_at` requires the confirmed flag.
                    if process.returned_at.is_some() {
                        return Err(DomainError::invalid_transition("already returned"));
                    }
                    process.delivery_confirmed = false;
                    process.delivered_at = None;
                }
                None => {
                    if let Some(at) = patch.delivered_at {
                        process.delivery_confirmed = true;
                        process.delivered_at = Some(at);
                    }
                }
            }
            if let Some(at) = patch.returned_at {
                if !process.delivery_confirmed {
                    return Err(DomainError::invalid_transition("not yet delivered"));
                }
                process.returned_at = Some(at);
            }
            if patch.document_url.is_some() {
                process.document_url = patch.document_url.clone();
            }

            state.processes.insert(process_id, process.clone());
            hydrate(state, &process)
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "process",
            process_id,
            "updated",
            serde_json::json!({ "items_replaced": new_items.is_some() }),
        ));
        Ok(view)
    }

    /// Delete a pending or delivered process, crediting every reserved
    /// quantity back and removing the associations with the record.
    ///
    /// Returned processes are not deletable: their reservations were already
    /// credited back at return time, so crediting again would inflate
    /// on-hand beyond the physical count.
    pub fn delete_process(
        &self,
        tenant_id: TenantId,
        process_id: ProcessId,
    ) -> Result<(), StoreError> {
        self.store.transact(|state| {
            let process = state.process_in(tenant_id, process_id)?;
            if process.returned_at.is_some() {
                return Err(DomainError::invalid_transition("already returned"));
            }

            for r in state.reservations(process_id) {
                state.item_in_mut(tenant_id, r.item_id)?.credit(r.quantity);
            }
            state.process_items.remove(&process_id);
            state.processes.remove(&process_id);
            Ok(())
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "process",
            process_id,
            "deleted",
            serde_json::json!({}),
        ));
        Ok(())
    }

    /// Confirm delivery.
    ///
    /// No tenant scoping here: the kiosk confirmation flow authenticates by
    /// possession of the process id alone. Tenant-scoped callers must
    /// validate ownership (e.g. via [`Self::get_process`]) before invoking.
    pub fn confirm_delivery(
        &self,
        process_id: ProcessId,
        delivered_at: Option<DateTime<Utc>>,
        document_url: Option<String>,
    ) -> Result<ProcessView, StoreError> {
        let view = self.store.transact(|state| {
            let mut process = state
                .processes
                .get(&process_id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("process"))?;
            process.confirm_delivery(delivered_at, document_url.clone())?;
            state.processes.insert(process_id, process.clone());
            hydrate(state, &process)
        })?;

        self.audit.record(AuditEvent::new(
            view.process.tenant_id,
            "process",
            process_id,
            "delivery_confirmed",
            serde_json::json!({ "delivered_at": view.process.delivered_at }),
        ));
        Ok(view)
    }

    /// Register the return of a delivered process, crediting every reserved
    /// quantity back in the same transaction.
    pub fn register_return(
        &self,
        tenant_id: TenantId,
        process_id: ProcessId,
        returned_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<ProcessView, StoreError> {
        let view = self.store.transact(|state| {
            let mut process = state.process_in(tenant_id, process_id)?.clone();
            process.register_return(returned_at, notes.clone())?;

            for r in state.reservations(process_id) {
                state.item_in_mut(tenant_id, r.item_id)?.credit(r.quantity);
            }
            state.processes.insert(process_id, process.clone());
            hydrate(state, &process)
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "process",
            process_id,
            "return_registered",
            serde_json::json!({ "returned_at": view.process.returned_at }),
        ));
        Ok(view)
    }

    /// Single-process read with ownership validation: a process belonging to
    /// another tenant is NotFound.
    pub fn get_process(
        &self,
        tenant_id: TenantId,
        process_id: ProcessId,
    ) -> Result<ProcessView, StoreError> {
        self.store.read(|state| {
            let process = state.process_in(tenant_id, process_id)?;
            hydrate(state, process)
        })
    }

    pub fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        query: ProcessQuery,
    ) -> Result<Page<ProcessView>, StoreError> {
        self.list_with(|p| p.tenant_id == tenant_id, &query, None)
    }

    pub fn list_for_collaborator(
        &self,
        tenant_id: TenantId,
        collaborator_id: CollaboratorId,
        query: ProcessQuery,
    ) -> Result<Page<ProcessView>, StoreError> {
        self.list_with(
            |p| p.tenant_id == tenant_id && p.collaborator_id == collaborator_id,
            &query,
            None,
        )
    }

    /// Unrestricted listing across every tenant (admin only at the API layer).
    pub fn list_all(&self, admin: AdminProcessQuery) -> Result<Page<ProcessView>, StoreError> {
        self.list_with(|_| true, &admin.query, admin.search.as_deref())
    }

    fn list_with(
        &self,
        filter: impl Fn(&Process) -> bool,
        query: &ProcessQuery,
        search: Option<&str>,
    ) -> Result<Page<ProcessView>, StoreError> {
        self.store.read(|state| {
            let mut matched: Vec<&Process> = state
                .processes
                .values()
                .filter(|p| filter(p))
                .filter(|p| query.status.matches(p))
                .filter(|p| query.scheduled_from.is_none_or(|f| p.scheduled_date >= f))
                .filter(|p| query.scheduled_to.is_none_or(|t| p.scheduled_date <= t))
                .collect();

            // Newest first; ids are UUIDv7 so they tie-break deterministically.
            matched.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
            });

            let mut views = Vec::with_capacity(matched.len());
            for p in matched {
                views.push(hydrate(state, p)?);
            }

            if let Some(needle) = search {
                let needle = needle.to_lowercase();
                views.retain(|v| {
                    v.collaborator_name.to_lowercase().contains(&needle)
                        || v.collaborator_national_id.to_lowercase().contains(&needle)
                        || v.company_name.to_lowercase().contains(&needle)
                });
            }

            Ok(Page::slice(views, query.pagination))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::store::InMemoryStore;
    use epitrack_inventory::{Item, NewItem};
    use epitrack_registry::{Collaborator, Company, NewCollaborator};

    struct Env {
        engine: ProcessEngine<Arc<InMemoryStore>>,
        store: Arc<InMemoryStore>,
        audit: Arc<InMemoryAuditSink>,
        tenant_id: TenantId,
        collaborator_id: CollaboratorId,
    }

    fn env() -> Env {
        let store = Arc::new(InMemoryStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let engine = ProcessEngine::new(store.clone(), audit.clone() as Arc<dyn AuditSink>);

        let company = Company::create("Acme Mining").unwrap();
        let tenant_id = company.id;
        let collaborator = Collaborator::create(
            tenant_id,
            NewCollaborator {
                name: "Maria Souza".to_string(),
                national_id: "123.456.789-00".to_string(),
            },
        )
        .unwrap();
        let collaborator_id = collaborator.id;

        store
            .transact(|state| {
                state.companies.insert(tenant_id, company.clone());
                state.collaborators.insert(collaborator_id, collaborator.clone());
                Ok(())
            })
            .unwrap();

        Env {
            engine,
            store,
            audit,
            tenant_id,
            collaborator_id,
        }
    }

    fn seed_item(env: &Env, certificate: &str, on_hand: u32) -> ItemId {
        let item = Item::create(
            env.tenant_id,
            NewItem {
                certificate: certificate.to_string(),
                name: format!("Item {certificate}"),
                on_hand,
                minimum: 1,
                description: None,
                purchase_date: None,
                life_date: None,
                expiry_date: None,
                unit_price: 1000,
            },
        )
        .unwrap();
        let id = item.id;
        env.store
            .transact(|state| {
                state.items.insert(id, item.clone());
                Ok(())
            })
            .unwrap();
        id
    }

    fn on_hand(env: &Env, item_id: ItemId) -> u32 {
        env.store
            .read(|state| Ok(state.item_in(env.tenant_id, item_id)?.on_hand))
            .unwrap()
    }

    fn create(env: &Env, items: Vec<Reservation>) -> Result<ProcessView, StoreError> {
        env.engine.create_process(
            env.tenant_id,
            CreateProcess {
                collaborator_id: env.collaborator_id,
                scheduled_date: Utc::now(),
                items,
                notes: None,
            },
        )
    }

    fn reservation(item_id: ItemId, quantity: u32) -> Reservation {
        Reservation { item_id, quantity }
    }

    #[test]
    fn create_debits_stock_and_hydrates_view() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);

        let view = create(&env, vec![reservation(a, 5)]).unwrap();

        assert_eq!(on_hand(&env, a), 5);
        assert_eq!(view.collaborator_name, "Maria Souza");
        assert_eq!(view.company_name, "Acme Mining");
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
        assert!(!view.process.delivery_confirmed);
    }

    #[test]
    fn create_with_insufficient_stock_leaves_no_partial_debit() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        let b = seed_item(&env, "CA-2", 2);

        let err = create(&env, vec![reservation(a, 5), reservation(b, 3)]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InsufficientStock {
                available: 2,
                requested: 3
            })
        ));

        // Item A's debit rolled back with the failed transaction.
        assert_eq!(on_hand(&env, a), 10);
        assert_eq!(on_hand(&env, b), 2);
    }

    #[test]
    fn create_rejects_inactive_collaborator() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        env.store
            .transact(|state| {
                state
                    .collaborators
                    .get_mut(&env.collaborator_id)
                    .unwrap()
                    .deactivate();
                Ok(())
            })
            .unwrap();

        let err = create(&env, vec![reservation(a, 1)]).unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));
        assert_eq!(on_hand(&env, a), 10);
    }

    #[test]
    fn create_rejects_unknown_item() {
        let env = env();
        let err = create(&env, vec![reservation(ItemId::new(), 1)]).unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound(_))));
    }

    #[test]
    fn create_merges_duplicate_item_entries() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);

        let view = create(&env, vec![reservation(a, 2), reservation(a, 3)]).unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
        assert_eq!(on_hand(&env, a), 5);
    }

    #[test]
    fn delete_restores_stock_to_pre_creation_value() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);

        let view = create(&env, vec![reservation(a, 5)]).unwrap();
        assert_eq!(on_hand(&env, a), 5);

        env.engine
            .delete_process(env.tenant_id, view.process.id)
            .unwrap();
        assert_eq!(on_hand(&env, a), 10);
        assert!(
            env.engine
                .get_process(env.tenant_id, view.process.id)
                .is_err()
        );
    }

    #[test]
    fn update_reconciles_item_list_as_net_delta() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        let b = seed_item(&env, "CA-2", 3);

        // [A:2] leaves A at 8.
        let view = create(&env, vec![reservation(a, 2)]).unwrap();
        assert_eq!(on_hand(&env, a), 8);

        // [A:1, B:3]: A restored to 10 then debited 1, B exactly drained.
        let updated = env
            .engine
            .update_process(
                env.tenant_id,
                view.process.id,
                ProcessPatch {
                    items: Some(vec![reservation(a, 1), reservation(b, 3)]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(on_hand(&env, a), 9);
        assert_eq!(on_hand(&env, b), 0);
        assert_eq!(updated.items.len(), 2);
    }

    #[test]
    fn update_with_insufficient_stock_adjusts_nothing() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        let b = seed_item(&env, "CA-2", 2);

        let view = create(&env, vec![reservation(a, 2)]).unwrap();

        let err = env
            .engine
            .update_process(
                env.tenant_id,
                view.process.id,
                ProcessPatch {
                    items: Some(vec![reservation(a, 1), reservation(b, 5)]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InsufficientStock {
                available: 2,
                requested: 5
            })
        ));

        // Neither the A restore nor the B debit leaked out.
        assert_eq!(on_hand(&env, a), 8);
        assert_eq!(on_hand(&env, b), 2);
    }

    #[test]
    fn update_reports_available_net_of_own_reservation() {
        let env = env();
        let a = seed_item(&env, "CA-1", 5);

        let view = create(&env, vec![reservation(a, 5)]).unwrap();
        assert_eq!(on_hand(&env, a), 0);

        // The process's own 5 are restored before validating, so 5 is fine...
        env.engine
            .update_process(
                env.tenant_id,
                view.process.id,
                ProcessPatch {
                    items: Some(vec![reservation(a, 5)]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(on_hand(&env, a), 0);

        // ...but 6 exceeds the restored availability.
        let err = env
            .engine
            .update_process(
                env.tenant_id,
                view.process.id,
                ProcessPatch {
                    items: Some(vec![reservation(a, 6)]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InsufficientStock {
                available: 5,
                requested: 6
            })
        ));
    }

    #[test]
    fn confirm_delivery_defaults_to_now_and_rejects_second_call() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        let view = create(&env, vec![reservation(a, 1)]).unwrap();

        let before = Utc::now();
        let confirmed = env
            .engine
            .confirm_delivery(view.process.id, None, None)
            .unwrap();
        let after = Utc::now();

        assert!(confirmed.process.delivery_confirmed);
        let at = confirmed.process.delivered_at.unwrap();
        assert!(at >= before && at <= after);

        // Stock unchanged: it was debited at creation.
        assert_eq!(on_hand(&env, a), 9);

        let err = env
            .engine
            .confirm_delivery(view.process.id, Some(Utc::now()), None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidTransition(_))
        ));

        // First timestamp preserved.
        let current = env
            .engine
            .get_process(env.tenant_id, view.process.id)
            .unwrap();
        assert_eq!(current.process.delivered_at, Some(at));
    }

    #[test]
    fn return_requires_delivery_and_credits_stock_once() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        let view = create(&env, vec![reservation(a, 4)]).unwrap();
        assert_eq!(on_hand(&env, a), 6);

        let err = env
            .engine
            .register_return(env.tenant_id, view.process.id, Utc::now(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidTransition(_))
        ));

        env.engine
            .confirm_delivery(view.process.id, None, None)
            .unwrap();
        let returned = env
            .engine
            .register_return(env.tenant_id, view.process.id, Utc::now(), Some("worn".into()))
            .unwrap();
        assert!(returned.process.returned_at.is_some());
        assert_eq!(on_hand(&env, a), 10);

        let err = env
            .engine
            .register_return(env.tenant_id, view.process.id, Utc::now(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidTransition(_))
        ));
        // No double credit.
        assert_eq!(on_hand(&env, a), 10);
    }

    #[test]
    fn deleting_a_returned_process_is_rejected_without_a_second_credit() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);

        let view = create(&env, vec![reservation(a, 5)]).unwrap();
        assert_eq!(on_hand(&env, a), 5);

        env.engine
            .confirm_delivery(view.process.id, None, None)
            .unwrap();
        env.engine
            .register_return(env.tenant_id, view.process.id, Utc::now(), None)
            .unwrap();
        assert_eq!(on_hand(&env, a), 10);

        // The return already credited the reservation back; deletion must
        // not credit it again.
        let err = env
            .engine
            .delete_process(env.tenant_id, view.process.id)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidTransition(_))
        ));
        assert_eq!(on_hand(&env, a), 10);

        // The record is kept for the issuance history.
        assert!(
            env.engine
                .get_process(env.tenant_id, view.process.id)
                .is_ok()
        );
    }

    #[test]
    fn replacing_items_of_a_returned_process_is_rejected() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);

        let view = create(&env, vec![reservation(a, 5)]).unwrap();
        env.engine
            .confirm_delivery(view.process.id, None, None)
            .unwrap();
        env.engine
            .register_return(env.tenant_id, view.process.id, Utc::now(), None)
            .unwrap();
        assert_eq!(on_hand(&env, a), 10);

        // Reconciling against already-credited reservations would inflate
        // on-hand beyond the physical count.
        let err = env
            .engine
            .update_process(
                env.tenant_id,
                view.process.id,
                ProcessPatch {
                    items: Some(vec![reservation(a, 1)]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidTransition(_))
        ));
        assert_eq!(on_hand(&env, a), 10);
    }

    #[test]
    fn unconfirming_a_returned_process_is_rejected() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);

        let view = create(&env, vec![reservation(a, 1)]).unwrap();
        env.engine
            .confirm_delivery(view.process.id, None, None)
            .unwrap();
        env.engine
            .register_return(env.tenant_id, view.process.id, Utc::now(), None)
            .unwrap();

        // returned_at requires the confirmed flag to stay set.
        let err = env
            .engine
            .update_process(
                env.tenant_id,
                view.process.id,
                ProcessPatch {
                    delivery_confirmed: Some(false),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidTransition(_))
        ));

        let current = env
            .engine
            .get_process(env.tenant_id, view.process.id)
            .unwrap();
        assert!(current.process.delivery_confirmed);
        assert!(current.process.returned_at.is_some());
    }

    #[test]
    fn get_process_hides_other_tenants() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        let view = create(&env, vec![reservation(a, 1)]).unwrap();

        let err = env
            .engine
            .get_process(TenantId::new(), view.process.id)
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound(_))));
    }

    #[test]
    fn listing_filters_status_and_paginates() {
        let env = env();
        let a = seed_item(&env, "CA-1", 100);

        let mut pending_ids = Vec::new();
        for _ in 0..12 {
            pending_ids.push(create(&env, vec![reservation(a, 1)]).unwrap().process.id);
        }
        for _ in 0..3 {
            let v = create(&env, vec![reservation(a, 1)]).unwrap();
            env.engine.confirm_delivery(v.process.id, None, None).unwrap();
        }

        let page = env
            .engine
            .list_for_tenant(
                env.tenant_id,
                ProcessQuery {
                    pagination: Pagination::new(Some(2), Some(10)).unwrap(),
                    status: StatusFilter::Pending,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(page.meta.total, 12);
        assert_eq!(page.meta.total_pages, 2);
        assert_eq!(page.records.len(), 2);
        assert!(
            page.records
                .iter()
                .all(|v| !v.process.delivery_confirmed)
        );
    }

    #[test]
    fn listing_orders_newest_created_first() {
        let env = env();
        let a = seed_item(&env, "CA-1", 100);

        let first = create(&env, vec![reservation(a, 1)]).unwrap().process.id;
        let second = create(&env, vec![reservation(a, 1)]).unwrap().process.id;

        let page = env
            .engine
            .list_for_tenant(env.tenant_id, ProcessQuery::default())
            .unwrap();
        let ids: Vec<ProcessId> = page.records.iter().map(|v| v.process.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn admin_listing_searches_collaborator_and_company() {
        let env = env();
        let a = seed_item(&env, "CA-1", 100);
        create(&env, vec![reservation(a, 1)]).unwrap();

        let hit = env
            .engine
            .list_all(AdminProcessQuery {
                search: Some("maria".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hit.meta.total, 1);

        let by_company = env
            .engine
            .list_all(AdminProcessQuery {
                search: Some("acme".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_company.meta.total, 1);

        let miss = env
            .engine
            .list_all(AdminProcessQuery {
                search: Some("nobody".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(miss.meta.total, 0);
    }

    #[test]
    fn mutations_emit_audit_events() {
        let env = env();
        let a = seed_item(&env, "CA-1", 10);
        let view = create(&env, vec![reservation(a, 1)]).unwrap();
        env.engine
            .confirm_delivery(view.process.id, None, None)
            .unwrap();
        env.engine
            .register_return(env.tenant_id, view.process.id, Utc::now(), None)
            .unwrap();

        let actions: Vec<String> = env
            .audit
            .for_tenant(env.tenant_id)
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["created", "delivery_confirmed", "return_registered"]);
    }
}
