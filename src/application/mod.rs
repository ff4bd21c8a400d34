pub mod allocation;
pub mod availability;
pub mod ledger;
pub mod locks;
pub mod views;

// Re-export key types for convenience
pub use allocation::{AllocationEngine, AllocationPolicy, CreateReservation, SharedAllocationEngine};
pub use availability::{AvailabilityProjector, SharedAvailabilityProjector};
pub use ledger::{CapacityLedger, LedgerTxn};
pub use locks::{KeyedLocks, SharedKeyedLocks};
pub use views::{AvailabilityView, InventoryView, ReservationView, ReservedBreakdown};
