//! `epitrack-inventory` — the PPE item (EPI) catalog entity.

pub mod item;

pub use item::{Item, NewItem};
