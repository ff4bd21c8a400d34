//! In-memory storage implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::inventory::{DailyInventory, InventoryRepository, LedgerKey};
use crate::domain::reservation::{ConfirmationCode, Reservation, ReservationRepository};
use crate::domain::{RepositoryProvider, WriteSet};
use crate::shared::errors::{DomainError, DomainResult};

/// Ledger rows keyed by (location, date).
#[derive(Default)]
pub struct InMemoryInventoryRepository {
    rows: DashMap<LedgerKey, DailyInventory>,
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn find(&self, key: &LedgerKey) -> DomainResult<Option<DailyInventory>> {
        Ok(self.rows.get(key).map(|r| r.clone()))
    }

    async fn upsert(&self, inventory: DailyInventory) -> DomainResult<()> {
        self.rows.insert(inventory.key.clone(), inventory);
        Ok(())
    }

    async fn list_from(&self, from: NaiveDate) -> DomainResult<Vec<DailyInventory>> {
        Ok(self
            .rows
            .iter()
            .filter(|e| e.key().date >= from)
            .map(|e| e.value().clone())
            .collect())
    }
}

/// Reservations keyed by id, with a code → id index.
#[derive(Default)]
pub struct InMemoryReservationRepository {
    by_id: DashMap<String, Reservation>,
    by_code: DashMap<String, String>,
}

impl InMemoryReservationRepository {
    fn collect_sorted(&self, filter: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        let mut list: Vec<Reservation> = self
            .by_id
            .iter()
            .filter(|e| filter(e.value()))
            .map(|e| e.value().clone())
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        list
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn insert(&self, reservation: Reservation) -> DomainResult<()> {
        if self.by_id.contains_key(&reservation.id) {
            return Err(DomainError::Conflict(format!("reservation id {}", reservation.id)));
        }
        // Claim the code first so two inserts with the same code cannot both win.
        match self.by_code.entry(reservation.confirmation_code.as_str().to_string()) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict(format!(
                    "confirmation code {}",
                    reservation.confirmation_code
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(reservation.id.clone());
            }
        }
        self.by_id.insert(reservation.id.clone(), reservation);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        Ok(self.by_id.get(id).map(|r| r.clone()))
    }

    async fn find_by_code(&self, code: &ConfirmationCode) -> DomainResult<Option<Reservation>> {
        let Some(id) = self.by_code.get(code.as_str()).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|r| r.clone()))
    }

    async fn code_exists(&self, code: &ConfirmationCode) -> DomainResult<bool> {
        Ok(self.by_code.contains_key(code.as_str()))
    }

    async fn update(&self, reservation: &Reservation) -> DomainResult<()> {
        let mut stored = self
            .by_id
            .get_mut(&reservation.id)
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation.id.as_str()))?;
        stored.status = reservation.status;
        stored.notes = reservation.notes.clone();
        stored.updated_at = reservation.updated_at;
        Ok(())
    }

    async fn list_by_location_and_date(
        &self,
        location_id: &str,
        date: NaiveDate,
    ) -> DomainResult<Vec<Reservation>> {
        Ok(self.collect_sorted(|r| r.location_id == location_id && r.reservation_date == date))
    }

    async fn list_by_date(&self, date: NaiveDate) -> DomainResult<Vec<Reservation>> {
        Ok(self.collect_sorted(|r| r.reservation_date == date))
    }
}

/// In-memory storage for development and testing. Contents are lost on
/// restart.
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    inventory: InMemoryInventoryRepository,
    reservations: InMemoryReservationRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    fn inventory(&self) -> &dyn InventoryRepository {
        &self.inventory
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    /// Every fallible check runs before the first write, so a failed set
    /// leaves no trace. Callers hold the ledger key's lock.
    async fn commit(&self, writes: WriteSet) -> DomainResult<()> {
        if let Some(r) = &writes.update {
            if !self.reservations.by_id.contains_key(&r.id) {
                return Err(DomainError::not_found("Reservation", "id", r.id.as_str()));
            }
        }
        if let Some(r) = writes.insert {
            self.reservations.insert(r).await?;
        }
        if let Some(r) = &writes.update {
            self.reservations.update(r).await?;
        }
        if let Some(row) = writes.inventory {
            self.inventory.upsert(row).await?;
        }
        Ok(())
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}
