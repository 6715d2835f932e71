//! Stock reservation arithmetic.
//!
//! Replacing a process's item list is expressed as a net per-item delta over
//! the union of the old and new reservation lists, instead of crediting
//! everything back and re-debiting as separate steps. The caller applies the
//! changes inside one store transaction.

use serde::{Deserialize, Serialize};

use epitrack_core::{DomainError, ItemId};

/// One requested reservation: which item, how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Per-item outcome of reconciling an old reservation list against a new one.
///
/// `previous` is what the process currently holds of the item, `requested`
/// what it should hold afterwards. Either side may be zero (item dropped from
/// or added to the list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationChange {
    pub item_id: ItemId,
    pub previous: u32,
    pub requested: u32,
}

/// Normalize a requested reservation list.
///
/// Quantities must be >= 1. Duplicate item entries are merged by summing
/// their quantities, so exactly one association exists per (process, item)
/// pair. First-seen order is preserved.
pub fn normalize(requested: Vec<Reservation>) -> Result<Vec<Reservation>, DomainError> {
    if requested.is_empty() {
        return Err(DomainError::validation(
            "a process must reserve at least one item",
        ));
    }

    let mut merged: Vec<Reservation> = Vec::with_capacity(requested.len());
    for r in requested {
        if r.quantity < 1 {
            return Err(DomainError::validation("item quantity must be >= 1"));
        }
        match merged.iter_mut().find(|m| m.item_id == r.item_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(r.quantity);
            }
            None => merged.push(r),
        }
    }
    Ok(merged)
}

/// Compute the reservation changes needed to move from `old` to `new`.
///
/// Both lists are assumed normalized (one entry per item). Items present in
/// both lists with unchanged quantities are omitted.
pub fn reconcile(old: &[Reservation], new: &[Reservation]) -> Vec<ReservationChange> {
    let mut changes: Vec<ReservationChange> = Vec::new();

    for o in old {
        let requested = new
            .iter()
            .find(|n| n.item_id == o.item_id)
            .map(|n| n.quantity)
            .unwrap_or(0);
        if requested != o.quantity {
            changes.push(ReservationChange {
                item_id: o.item_id,
                previous: o.quantity,
                requested,
            });
        }
    }

    for n in new {
        if !old.iter().any(|o| o.item_id == n.item_id) {
            changes.push(ReservationChange {
                item_id: n.item_id,
                previous: 0,
                requested: n.quantity,
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(item_id: ItemId, quantity: u32) -> Reservation {
        Reservation { item_id, quantity }
    }

    #[test]
    fn normalize_rejects_empty_list() {
        assert!(normalize(vec![]).is_err());
    }

    #[test]
    fn normalize_rejects_zero_quantity() {
        let res = normalize(vec![r(ItemId::new(), 0)]);
        assert!(matches!(res, Err(DomainError::Validation(_))));
    }

    #[test]
    fn normalize_merges_duplicate_items() {
        let a = ItemId::new();
        let b = ItemId::new();
        let merged = normalize(vec![r(a, 2), r(b, 1), r(a, 3)]).unwrap();
        assert_eq!(merged, vec![r(a, 5), r(b, 1)]);
    }

    #[test]
    fn reconcile_covers_dropped_kept_and_added_items() {
        let a = ItemId::new();
        let b = ItemId::new();
        let c = ItemId::new();

        let old = vec![r(a, 2), r(b, 4)];
        let new = vec![r(a, 1), r(c, 3)];

        let changes = reconcile(&old, &new);
        assert_eq!(
            changes,
            vec![
                ReservationChange {
                    item_id: a,
                    previous: 2,
                    requested: 1
                },
                ReservationChange {
                    item_id: b,
                    previous: 4,
                    requested: 0
                },
                ReservationChange {
                    item_id: c,
                    previous: 0,
                    requested: 3
                },
            ]
        );
    }

    #[test]
    fn reconcile_omits_unchanged_items() {
        let a = ItemId::new();
        let old = vec![r(a, 2)];
        let new = vec![r(a, 2)];
        assert!(reconcile(&old, &new).is_empty());
    }
}
