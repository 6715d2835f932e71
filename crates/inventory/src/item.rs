use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use epitrack_core::{DomainError, ItemId, TenantId};

/// A PPE item tracked per tenant.
///
/// `on_hand` is the available stock counter: debited when a process reserves
/// the item, credited when the process is deleted or the items are returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub tenant_id: TenantId,
    /// Approval certificate code ("CA"). Unique per tenant.
    pub certificate: String,
    pub name: String,
    pub on_hand: u32,
    pub minimum: u32,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    /// End of usable life.
    pub life_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    /// Unit price in integer cents.
    pub unit_price: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub certificate: String,
    pub name: String,
    pub on_hand: u32,
    pub minimum: u32,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub life_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub unit_price: i64,
}

impl Item {
    pub fn create(tenant_id: TenantId, new: NewItem) -> Result<Self, DomainError> {
        if new.certificate.trim().is_empty() {
            return Err(DomainError::validation("certificate cannot be empty"));
        }
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if new.unit_price < 0 {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }
        Ok(Self {
            id: ItemId::new(),
            tenant_id,
            certificate: new.certificate,
            name: new.name,
            on_hand: new.on_hand,
            minimum: new.minimum,
            description: new.description,
            purchase_date: new.purchase_date,
            life_date: new.life_date,
            expiry_date: new.expiry_date,
            unit_price: new.unit_price,
            created_at: Utc::now(),
        })
    }

    /// Debit `quantity` from on-hand stock.
    ///
    /// On-hand must never go negative: the debit is rejected up front,
    /// reporting what was available vs. requested.
    pub fn debit(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity > self.on_hand {
            return Err(DomainError::insufficient_stock(self.on_hand, quantity));
        }
        self.on_hand -= quantity;
        Ok(())
    }

    /// Credit `quantity` back to on-hand stock (process deleted or returned).
    pub fn credit(&mut self, quantity: u32) {
        self.on_hand = self.on_hand.saturating_add(quantity);
    }

    /// Whether stock has fallen to or below the configured minimum.
    pub fn is_below_minimum(&self) -> bool {
        self.on_hand <= self.minimum
    }
}
