//! Repository access for the domain layer

use async_trait::async_trait;

use super::inventory::{DailyInventory, InventoryRepository};
use super::reservation::{Reservation, ReservationRepository};
use crate::shared::errors::DomainResult;

/// Writes that land together or not at all.
///
/// A ledger row change and the reservation change that justifies it always
/// travel in one set, so `reserved_units` cannot drift from the reservations
/// that hold it.
#[derive(Debug, Clone, Default)]
pub struct WriteSet {
    pub insert: Option<Reservation>,
    pub update: Option<Reservation>,
    pub inventory: Option<DailyInventory>,
}

impl WriteSet {
    pub fn insert(reservation: Reservation) -> Self {
        Self {
            insert: Some(reservation),
            ..Self::default()
        }
    }

    /// Status/notes change of an existing reservation.
    pub fn update(reservation: Reservation) -> Self {
        Self {
            update: Some(reservation),
            ..Self::default()
        }
    }

    pub fn with_inventory(mut self, row: Option<DailyInventory>) -> Self {
        self.inventory = row;
        self
    }
}

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let row = repos.inventory().find(&key).await?;
///     let r = repos.reservations().find_by_code(&code).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn inventory(&self) -> &dyn InventoryRepository;
    fn reservations(&self) -> &dyn ReservationRepository;

    /// Apply every write in `writes` atomically. On error nothing is applied.
    async fn commit(&self, writes: WriteSet) -> DomainResult<()>;

    /// Cheap liveness probe of the backing store.
    async fn ping(&self) -> DomainResult<()>;
}
