//! Transactional store abstraction.
//!
//! The persistence handle is injected into every service (no module-level
//! singleton client). A transaction is a closure over the whole state: the
//! in-memory implementation applies it to a scratch copy and swaps the copy
//! in only when the closure succeeds, so a mid-sequence failure leaves no
//! partial adjustment behind. Writers are serialized behind one lock, which
//! is the concurrency control upholding the stock non-negativity invariant
//! under racing check-then-debit sequences.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use epitrack_core::{CollaboratorId, DomainError, ItemId, ProcessId, TenantId};
use epitrack_inventory::Item;
use epitrack_process::{Process, ProcessItem, Reservation};
use epitrack_registry::{Collaborator, Company};

/// Store-level error: either a deterministic domain failure raised inside a
/// transaction, or a backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// The full persisted state.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub companies: HashMap<TenantId, Company>,
    pub collaborators: HashMap<CollaboratorId, Collaborator>,
    pub items: HashMap<ItemId, Item>,
    pub processes: HashMap<ProcessId, Process>,
    pub process_items: HashMap<ProcessId, Vec<ProcessItem>>,
}

impl StoreState {
    /// Tenant lookup. NotFound covers both missing and cross-tenant records,
    /// so callers never learn whether a foreign id exists.
    pub fn company(&self, tenant_id: TenantId) -> Result<&Company, DomainError> {
        self.companies
            .get(&tenant_id)
            .ok_or_else(|| DomainError::not_found("company"))
    }

    pub fn collaborator_in(
        &self,
        tenant_id: TenantId,
        id: CollaboratorId,
    ) -> Result<&Collaborator, DomainError> {
        self.collaborators
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .ok_or_else(|| DomainError::not_found("collaborator"))
    }

    pub fn item_in(&self, tenant_id: TenantId, id: ItemId) -> Result<&Item, DomainError> {
        self.items
            .get(&id)
            .filter(|i| i.tenant_id == tenant_id)
            .ok_or_else(|| DomainError::not_found("item"))
    }

    pub fn item_in_mut(
        &mut self,
        tenant_id: TenantId,
        id: ItemId,
    ) -> Result<&mut Item, DomainError> {
        self.items
            .get_mut(&id)
            .filter(|i| i.tenant_id == tenant_id)
            .ok_or_else(|| DomainError::not_found("item"))
    }

    pub fn process_in(
        &self,
        tenant_id: TenantId,
        id: ProcessId,
    ) -> Result<&Process, DomainError> {
        self.processes
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| DomainError::not_found("process"))
    }

    /// Current reservations held by a process.
    pub fn reservations(&self, process_id: ProcessId) -> Vec<Reservation> {
        self.process_items
            .get(&process_id)
            .map(|rows| {
                rows.iter()
                    .map(|r| Reservation {
                        item_id: r.item_id,
                        quantity: r.quantity,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Injected persistence handle.
///
/// Generic closures (instead of fine-grained repository methods) keep the
/// atomicity boundary explicit: everything inside one `transact` call commits
/// or rolls back together.
pub trait Store: Send + Sync {
    /// Run a read-only closure against the committed state.
    fn read<T>(
        &self,
        f: impl FnOnce(&StoreState) -> Result<T, DomainError>,
    ) -> Result<T, StoreError>;

    /// Run a mutating closure as one atomic transaction.
    fn transact<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, DomainError>,
    ) -> Result<T, StoreError>;
}

impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    fn read<T>(
        &self,
        f: impl FnOnce(&StoreState) -> Result<T, DomainError>,
    ) -> Result<T, StoreError> {
        (**self).read(f)
    }

    fn transact<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, DomainError>,
    ) -> Result<T, StoreError> {
        (**self).transact(f)
    }
}

/// In-memory store with copy-on-write transactions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn read<T>(
        &self,
        f: impl FnOnce(&StoreState) -> Result<T, DomainError>,
    ) -> Result<T, StoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        f(&guard).map_err(StoreError::from)
    }

    fn transact<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, DomainError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;

        // All-or-nothing: mutate a scratch copy, commit only on success.
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}
