//! Daily inventory aggregate
//!
//! The capacity ledger row per (location, date) and the availability
//! classification derived from it.

pub mod model;
pub mod repository;

pub use model::{
    AvailabilityStatus, AvailabilityThresholds, DailyInventory, InventorySnapshot, LedgerKey,
};
pub use repository::InventoryRepository;
