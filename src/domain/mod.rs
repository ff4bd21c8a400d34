//! Core business entities, value types and repository traits

pub mod actor;
pub mod inventory;
pub mod location;
pub mod repositories;
pub mod reservation;

pub use actor::{Actor, ActorRole};
pub use inventory::{
    AvailabilityStatus, AvailabilityThresholds, DailyInventory, InventoryRepository,
    InventorySnapshot, LedgerKey,
};
pub use location::{Location, LocationCatalog, OpeningHours, SharedLocationCatalog};
pub use repositories::{RepositoryProvider, WriteSet};
pub use reservation::{
    ConfirmationCode, NewReservation, Reservation, ReservationRepository, ReservationStatus,
};

pub use crate::shared::errors::{DomainError, DomainResult};
