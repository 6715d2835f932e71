//! Registry services: companies, collaborators, and item CRUD.
//!
//! Per-tenant uniqueness (item certificate, collaborator national id) is
//! enforced here rather than in the domain types, because uniqueness is a
//! property of the stored population, not of a single record.

use std::sync::Arc;

use chrono::NaiveDate;

use epitrack_core::{CollaboratorId, DomainError, ItemId, Page, Pagination, TenantId};
use epitrack_inventory::{Item, NewItem};
use epitrack_registry::{Collaborator, Company, NewCollaborator};

use crate::audit::{AuditEvent, AuditSink};
use crate::store::{Store, StoreError};

/// Partial update for a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollaboratorPatch {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub active: Option<bool>,
}

/// Partial update for an item. `on_hand` here is an absolute restock value,
/// not a delta; reservation accounting stays with the process engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemPatch {
    pub certificate: Option<String>,
    pub name: Option<String>,
    pub on_hand: Option<u32>,
    pub minimum: Option<u32>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub life_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub unit_price: Option<i64>,
}

pub struct RegistryService<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
}

impl<S> RegistryService<S>
where
    S: Store,
{
    pub fn new(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    // --- companies -------------------------------------------------------

    pub fn create_company(&self, name: &str) -> Result<Company, StoreError> {
        let company = self.store.transact(|state| {
            let company = Company::create(name)?;
            if state
                .companies
                .values()
                .any(|c| c.name.eq_ignore_ascii_case(&company.name))
            {
                return Err(DomainError::conflict("company name already registered"));
            }
            state.companies.insert(company.id, company.clone());
            Ok(company)
        })?;

        self.audit.record(AuditEvent::new(
            company.id,
            "company",
            company.id,
            "created",
            serde_json::json!({ "name": company.name }),
        ));
        Ok(company)
    }

    pub fn get_company(&self, tenant_id: TenantId) -> Result<Company, StoreError> {
        self.store.read(|state| state.company(tenant_id).cloned())
    }

    pub fn list_companies(&self, pagination: Pagination) -> Result<Page<Company>, StoreError> {
        self.store.read(|state| {
            let mut companies: Vec<Company> = state.companies.values().cloned().collect();
            companies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(Page::slice(companies, pagination))
        })
    }

    /// Deactivation, not deletion: the company's processes and audit trail
    /// stay queryable.
    pub fn deactivate_company(&self, tenant_id: TenantId) -> Result<Company, StoreError> {
        let company = self.store.transact(|state| {
            state.company(tenant_id)?;
            let company = state
                .companies
                .get_mut(&tenant_id)
                .ok_or_else(|| DomainError::not_found("company"))?;
            company.deactivate();
            Ok(company.clone())
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "company",
            tenant_id,
            "deactivated",
            serde_json::json!({}),
        ));
        Ok(company)
    }

    // --- collaborators ---------------------------------------------------

    pub fn create_collaborator(
        &self,
        tenant_id: TenantId,
        new: NewCollaborator,
    ) -> Result<Collaborator, StoreError> {
        let collaborator = self.store.transact(|state| {
            state.company(tenant_id)?;
            let collaborator = Collaborator::create(tenant_id, new.clone())?;
            if state
                .collaborators
                .values()
                .any(|c| c.tenant_id == tenant_id && c.national_id == collaborator.national_id)
            {
                return Err(DomainError::conflict("national_id already registered"));
            }
            state
                .collaborators
                .insert(collaborator.id, collaborator.clone());
            Ok(collaborator)
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "collaborator",
            collaborator.id,
            "created",
            serde_json::json!({ "national_id": collaborator.national_id }),
        ));
        Ok(collaborator)
    }

    pub fn get_collaborator(
        &self,
        tenant_id: TenantId,
        id: CollaboratorId,
    ) -> Result<Collaborator, StoreError> {
        self.store
            .read(|state| state.collaborator_in(tenant_id, id).cloned())
    }

    /// Tenant listing with optional case-insensitive search over name and
    /// national id.
    pub fn list_collaborators(
        &self,
        tenant_id: TenantId,
        pagination: Pagination,
        search: Option<&str>,
    ) -> Result<Page<Collaborator>, StoreError> {
        self.store.read(|state| {
            let needle = search.map(str::to_lowercase);
            let mut collaborators: Vec<Collaborator> = state
                .collaborators
                .values()
                .filter(|c| c.tenant_id == tenant_id)
                .filter(|c| {
                    needle.as_deref().is_none_or(|n| {
                        c.name.to_lowercase().contains(n)
                            || c.national_id.to_lowercase().contains(n)
                    })
                })
                .cloned()
                .collect();
            collaborators.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(Page::slice(collaborators, pagination))
        })
    }

    pub fn update_collaborator(
        &self,
        tenant_id: TenantId,
        id: CollaboratorId,
        patch: CollaboratorPatch,
    ) -> Result<Collaborator, StoreError> {
        let collaborator = self.store.transact(|state| {
            state.collaborator_in(tenant_id, id)?;

            if let Some(national_id) = &patch.national_id {
                if national_id.trim().is_empty() {
                    return Err(DomainError::validation("national_id cannot be empty"));
                }
                if state.collaborators.values().any(|c| {
                    c.tenant_id == tenant_id && c.id != id && &c.national_id == national_id
                }) {
                    return Err(DomainError::conflict("national_id already registered"));
                }
            }
            if let Some(name) = &patch.name {
                if name.trim().is_empty() {
                    return Err(DomainError::validation("collaborator name cannot be empty"));
                }
            }

            let collaborator = state
                .collaborators
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("collaborator"))?;
            if let Some(name) = patch.name.clone() {
                collaborator.name = name;
            }
            if let Some(national_id) = patch.national_id.clone() {
                collaborator.national_id = national_id;
            }
            if let Some(active) = patch.active {
                collaborator.active = active;
            }
            Ok(collaborator.clone())
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "collaborator",
            id,
            "updated",
            serde_json::json!({}),
        ));
        Ok(collaborator)
    }

    /// A collaborator with processes on record cannot be removed; deactivate
    /// instead so the issuance history keeps resolving.
    pub fn delete_collaborator(
        &self,
        tenant_id: TenantId,
        id: CollaboratorId,
    ) -> Result<(), StoreError> {
        self.store.transact(|state| {
            state.collaborator_in(tenant_id, id)?;
            if state.processes.values().any(|p| p.collaborator_id == id) {
                return Err(DomainError::conflict(
                    "collaborator has processes on record; deactivate instead",
                ));
            }
            state.collaborators.remove(&id);
            Ok(())
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "collaborator",
            id,
            "deleted",
            serde_json::json!({}),
        ));
        Ok(())
    }

    // --- items -----------------------------------------------------------

    pub fn create_item(&self, tenant_id: TenantId, new: NewItem) -> Result<Item, StoreError> {
        let item = self.store.transact(|state| {
            state.company(tenant_id)?;
            let item = Item::create(tenant_id, new.clone())?;
            if state
                .items
                .values()
                .any(|i| i.tenant_id == tenant_id && i.certificate == item.certificate)
            {
                return Err(DomainError::conflict("certificate already registered"));
            }
            state.items.insert(item.id, item.clone());
            Ok(item)
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "item",
            item.id,
            "created",
            serde_json::json!({ "certificate": item.certificate }),
        ));
        Ok(item)
    }

    pub fn get_item(&self, tenant_id: TenantId, id: ItemId) -> Result<Item, StoreError> {
        self.store.read(|state| state.item_in(tenant_id, id).cloned())
    }

    /// Tenant listing with optional case-insensitive search over name and
    /// certificate.
    pub fn list_items(
        &self,
        tenant_id: TenantId,
        pagination: Pagination,
        search: Option<&str>,
    ) -> Result<Page<Item>, StoreError> {
        self.store.read(|state| {
            let needle = search.map(str::to_lowercase);
            let mut items: Vec<Item> = state
                .items
                .values()
                .filter(|i| i.tenant_id == tenant_id)
                .filter(|i| {
                    needle.as_deref().is_none_or(|n| {
                        i.name.to_lowercase().contains(n)
                            || i.certificate.to_lowercase().contains(n)
                    })
                })
                .cloned()
                .collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(Page::slice(items, pagination))
        })
    }

    /// Items at or below their configured minimum stock.
    pub fn list_items_below_minimum(&self, tenant_id: TenantId) -> Result<Vec<Item>, StoreError> {
        self.store.read(|state| {
            let mut items: Vec<Item> = state
                .items
                .values()
                .filter(|i| i.tenant_id == tenant_id && i.is_below_minimum())
                .cloned()
                .collect();
            items.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(items)
        })
    }

    pub fn update_item(
        &self,
        tenant_id: TenantId,
        id: ItemId,
        patch: ItemPatch,
    ) -> Result<Item, StoreError> {
        let item = self.store.transact(|state| {
            state.item_in(tenant_id, id)?;

            if let Some(certificate) = &patch.certificate {
                if certificate.trim().is_empty() {
                    return Err(DomainError::validation("certificate cannot be empty"));
                }
                if state
                    .items
                    .values()
                    .any(|i| i.tenant_id == tenant_id && i.id != id && &i.certificate == certificate)
                {
                    return Err(DomainError::conflict("certificate already registered"));
                }
            }
            if let Some(name) = &patch.name {
                if name.trim().is_empty() {
                    return Err(DomainError::validation("name cannot be empty"));
                }
            }
            if let Some(price) = patch.unit_price {
                if price < 0 {
                    return Err(DomainError::validation("unit_price cannot be negative"));
                }
            }

            let item = state.item_in_mut(tenant_id, id)?;
            if let Some(certificate) = patch.certificate.clone() {
                item.certificate = certificate;
            }
            if let Some(name) = patch.name.clone() {
                item.name = name;
            }
            if let Some(on_hand) = patch.on_hand {
                item.on_hand = on_hand;
            }
            if let Some(minimum) = patch.minimum {
                item.minimum = minimum;
            }
            if patch.description.is_some() {
                item.description = patch.description.clone();
            }
            if patch.purchase_date.is_some() {
                item.purchase_date = patch.purchase_date;
            }
            if patch.life_date.is_some() {
                item.life_date = patch.life_date;
            }
            if patch.expiry_date.is_some() {
                item.expiry_date = patch.expiry_date;
            }
            if let Some(price) = patch.unit_price {
                item.unit_price = price;
            }
            Ok(item.clone())
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "item",
            id,
            "updated",
            serde_json::json!({}),
        ));
        Ok(item)
    }

    /// Deleting an item still reserved by any process would orphan the
    /// association rows, so it is a conflict.
    pub fn delete_item(&self, tenant_id: TenantId, id: ItemId) -> Result<(), StoreError> {
        self.store.transact(|state| {
            state.item_in(tenant_id, id)?;
            if state
                .process_items
                .values()
                .flatten()
                .any(|row| row.item_id == id)
            {
                return Err(DomainError::conflict("item is referenced by processes"));
            }
            state.items.remove(&id);
            Ok(())
        })?;

        self.audit.record(AuditEvent::new(
            tenant_id,
            "item",
            id,
            "deleted",
            serde_json::json!({}),
        ));
        Ok(())
    }
}
