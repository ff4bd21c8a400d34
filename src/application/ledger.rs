//! Capacity ledger
//!
//! Tracks total and reserved stock per (location, date). All mutations go
//! through a [`LedgerTxn`], which owns the key's lock for its lifetime, so
//! the check-then-increment in [`LedgerTxn::try_reserve`] is indivisible with
//! respect to every other writer of the same key.
//!
//! When a ledger change must land together with a reservation write, the
//! `prepare_*` methods compute the next row without storing it, and the
//! caller commits both through [`RepositoryProvider::commit`].

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::locks::{KeyGuard, SharedKeyedLocks};
use crate::domain::inventory::{DailyInventory, InventorySnapshot, LedgerKey};
use crate::domain::reservation::Reservation;
use crate::domain::RepositoryProvider;
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::time::SharedClock;

pub struct CapacityLedger {
    repos: Arc<dyn RepositoryProvider>,
    locks: SharedKeyedLocks,
    clock: SharedClock,
}

/// Exclusive access to one ledger key.
pub struct LedgerTxn<'a> {
    ledger: &'a CapacityLedger,
    key: LedgerKey,
    _guard: KeyGuard,
}

impl CapacityLedger {
    pub fn new(repos: Arc<dyn RepositoryProvider>, locks: SharedKeyedLocks, clock: SharedClock) -> Self {
        Self { repos, locks, clock }
    }

    /// Lock `key` for a multi-step transaction.
    pub async fn begin(&self, key: &LedgerKey) -> DomainResult<LedgerTxn<'_>> {
        let guard = self.locks.acquire(key).await?;
        Ok(LedgerTxn {
            ledger: self,
            key: key.clone(),
            _guard: guard,
        })
    }

    /// Current snapshot. Lock-free; rows are only ever replaced whole, so a
    /// reader sees either the state before or after a transaction.
    pub async fn read(&self, key: &LedgerKey) -> DomainResult<InventorySnapshot> {
        Ok(match self.repos.inventory().find(key).await? {
            Some(row) => row.snapshot(),
            None => InventorySnapshot::unset(key),
        })
    }

    /// Set or overwrite the day's total stock. Reserved units are untouched;
    /// lowering the total below them keeps existing holds but blocks new ones.
    pub async fn set_total(&self, key: &LedgerKey, total: u32) -> DomainResult<InventorySnapshot> {
        let txn = self.begin(key).await?;
        let mut row = txn
            .load()
            .await?
            .unwrap_or_else(|| DailyInventory::new(key.clone(), self.clock.now_utc()));
        let previous = row.total_units;
        row.total_units = Some(total);
        txn.store(row.clone()).await?;

        metrics::counter!("inventory_updates_total").increment(1);
        match previous {
            Some(prev) => info!(key = %key, from = prev, to = total, "Updated daily inventory"),
            None => info!(key = %key, total, "Created daily inventory"),
        }
        if row.reserved_units > total {
            warn!(
                key = %key,
                total,
                reserved = row.reserved_units,
                "Total lowered below reserved units; new reservations blocked"
            );
        }
        Ok(row.snapshot())
    }

    /// Single-shot admission: lock, check, increment.
    pub async fn try_reserve(&self, key: &LedgerKey, units: u32) -> DomainResult<InventorySnapshot> {
        self.begin(key).await?.try_reserve(units).await
    }

    /// Single-shot release, floored at zero.
    pub async fn release(&self, key: &LedgerKey, units: u32) -> DomainResult<InventorySnapshot> {
        self.begin(key).await?.release(units).await
    }

    /// Recompute `reserved_units` from the reservations for every row dated
    /// `from` or later. Returns how many rows were corrected.
    pub async fn reconcile_from(&self, from: NaiveDate) -> DomainResult<usize> {
        let rows = self.repos.inventory().list_from(from).await?;
        let mut corrected = 0;
        for row in rows {
            let txn = self.begin(&row.key).await?;
            let Some(mut current) = txn.load().await? else {
                continue;
            };
            let held: u32 = self
                .repos
                .reservations()
                .list_by_location_and_date(&row.key.location_id, row.key.date)
                .await?
                .iter()
                .map(Reservation::held_units)
                .sum();
            if current.reserved_units != held {
                warn!(
                    key = %row.key,
                    ledger = current.reserved_units,
                    held,
                    "Ledger drift corrected"
                );
                current.reserved_units = held;
                txn.store(current).await?;
                corrected += 1;
            }
        }
        if corrected > 0 {
            metrics::counter!("ledger_reconciled_rows_total").increment(corrected as u64);
        }
        Ok(corrected)
    }
}

impl LedgerTxn<'_> {
    async fn load(&self) -> DomainResult<Option<DailyInventory>> {
        self.ledger.repos.inventory().find(&self.key).await
    }

    async fn store(&self, mut row: DailyInventory) -> DomainResult<()> {
        row.updated_at = self.ledger.clock.now_utc();
        self.ledger.repos.inventory().upsert(row).await
    }

    /// The row with `units` more held, stamped and ready to commit. Fails with
    /// `CapacityExceeded` if the inventory is unset or too little remains.
    /// Nothing is written.
    pub async fn prepare_reserve(&self, units: u32) -> DomainResult<DailyInventory> {
        let row = self.load().await?;
        let Some(mut row) = row.filter(|r| r.total_units.is_some()) else {
            debug!(key = %self.key, units, "Admission denied: inventory not set");
            return Err(DomainError::CapacityExceeded {
                requested: units,
                available: None,
            });
        };

        if !row.can_hold(units) {
            let available = row.available_units().unwrap_or(0);
            debug!(key = %self.key, units, available, "Admission denied: not enough stock");
            return Err(DomainError::CapacityExceeded {
                requested: units,
                available: Some(available),
            });
        }

        row.reserved_units += units;
        row.updated_at = self.ledger.clock.now_utc();
        Ok(row)
    }

    /// The row with `units` returned, floored at zero. `None` when the day
    /// has no row. Nothing is written.
    pub async fn prepare_release(&self, units: u32) -> DomainResult<Option<DailyInventory>> {
        let Some(mut row) = self.load().await? else {
            warn!(key = %self.key, units, "Release on a day without inventory row");
            return Ok(None);
        };

        if row.reserved_units < units {
            warn!(
                key = %self.key,
                units,
                reserved = row.reserved_units,
                "Release exceeds reserved units; flooring at zero"
            );
        }
        row.reserved_units = row.reserved_units.saturating_sub(units);
        row.updated_at = self.ledger.clock.now_utc();
        Ok(Some(row))
    }

    /// Hold `units` if the inventory is set and enough stock remains;
    /// otherwise fail with `CapacityExceeded` and change nothing.
    pub async fn try_reserve(&self, units: u32) -> DomainResult<InventorySnapshot> {
        let row = self.prepare_reserve(units).await?;
        self.store(row.clone()).await?;
        debug!(key = %self.key, units, reserved = row.reserved_units, "Units held");
        Ok(row.snapshot())
    }

    /// Return `units` to the pool. Never drives `reserved_units` below zero.
    pub async fn release(&self, units: u32) -> DomainResult<InventorySnapshot> {
        let Some(row) = self.prepare_release(units).await? else {
            return Ok(InventorySnapshot::unset(&self.key));
        };
        self.store(row.clone()).await?;
        debug!(key = %self.key, units, reserved = row.reserved_units, "Units released");
        Ok(row.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::locks::KeyedLocks;
    use crate::domain::reservation::{ConfirmationCode, NewReservation, ReservationStatus};
    use crate::domain::WriteSet;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::FixedClock;
    use std::time::Duration;

    fn ledger_over(repos: Arc<dyn RepositoryProvider>) -> CapacityLedger {
        CapacityLedger::new(
            repos,
            Arc::new(KeyedLocks::new(Duration::from_millis(200))),
            Arc::new(FixedClock::new(key().date.and_hms_opt(9, 0, 0).unwrap())),
        )
    }

    fn ledger() -> CapacityLedger {
        ledger_over(Arc::new(InMemoryRepositoryProvider::new()))
    }

    fn key() -> LedgerKey {
        LedgerKey::new("market", NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
    }

    #[tokio::test]
    async fn read_of_unknown_day_is_unset() {
        let snap = ledger().read(&key()).await.unwrap();
        assert!(!snap.inventory_set);
        assert_eq!(snap.available_units, None);
    }

    #[tokio::test]
    async fn reserve_requires_inventory() {
        let err = ledger().try_reserve(&key(), 1).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::CapacityExceeded { requested: 1, available: None }
        ));
    }

    #[tokio::test]
    async fn reserve_and_reject_over_capacity() {
        let ledger = ledger();
        ledger.set_total(&key(), 10).await.unwrap();

        let snap = ledger.try_reserve(&key(), 7).await.unwrap();
        assert_eq!(snap.available_units, Some(3));

        let err = ledger.try_reserve(&key(), 4).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::CapacityExceeded { requested: 4, available: Some(3) }
        ));
        assert_eq!(ledger.read(&key()).await.unwrap().available_units, Some(3));
    }

    #[tokio::test]
    async fn exact_fit_is_admitted() {
        let ledger = ledger();
        ledger.set_total(&key(), 3).await.unwrap();
        let snap = ledger.try_reserve(&key(), 3).await.unwrap();
        assert_eq!(snap.available_units, Some(0));
    }

    #[tokio::test]
    async fn set_total_keeps_reserved_and_floors_available() {
        let ledger = ledger();
        ledger.set_total(&key(), 10).await.unwrap();
        ledger.try_reserve(&key(), 6).await.unwrap();

        let snap = ledger.set_total(&key(), 4).await.unwrap();
        assert_eq!(snap.total_units, Some(4));
        assert_eq!(snap.reserved_units, 6);
        assert_eq!(snap.available_units, Some(0));
        assert_eq!(snap.utilization_percent, 150.0);

        assert!(ledger.try_reserve(&key(), 1).await.is_err());
    }

    #[tokio::test]
    async fn zero_total_blocks_but_counts_as_set() {
        let ledger = ledger();
        let snap = ledger.set_total(&key(), 0).await.unwrap();
        assert!(snap.inventory_set);
        let err = ledger.try_reserve(&key(), 1).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::CapacityExceeded { available: Some(0), .. }
        ));
    }

    #[tokio::test]
    async fn release_floors_at_zero() {
        let ledger = ledger();
        ledger.set_total(&key(), 5).await.unwrap();
        ledger.try_reserve(&key(), 2).await.unwrap();

        let snap = ledger.release(&key(), 5).await.unwrap();
        assert_eq!(snap.reserved_units, 0);
        assert_eq!(snap.available_units, Some(5));
    }

    #[tokio::test]
    async fn concurrent_reservations_never_overbook() {
        let ledger = Arc::new(ledger());
        ledger.set_total(&key(), 5).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.try_reserve(&key(), 1).await }));
        }

        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 5);
        assert_eq!(ledger.read(&key()).await.unwrap().reserved_units, 5);
    }

    #[tokio::test]
    async fn prepare_does_not_write() {
        let ledger = ledger();
        ledger.set_total(&key(), 4).await.unwrap();

        let txn = ledger.begin(&key()).await.unwrap();
        let row = txn.prepare_reserve(3).await.unwrap();
        assert_eq!(row.reserved_units, 3);
        assert_eq!(row.updated_at.naive_utc(), key().date.and_hms_opt(9, 0, 0).unwrap());
        drop(txn);

        assert_eq!(ledger.read(&key()).await.unwrap().reserved_units, 0);
    }

    fn held(code: &str, chicken: u32, status: ReservationStatus) -> Reservation {
        let mut r = Reservation::confirmed(
            NewReservation {
                location_id: "market".into(),
                reservation_date: key().date,
                customer_name: "Dana".into(),
                customer_email: None,
                chicken_count: chicken,
                fries_count: 0,
                pickup_time: None,
                notes: None,
            },
            ConfirmationCode::parse(code),
            chrono::Utc::now(),
        );
        r.status = status;
        r
    }

    #[tokio::test]
    async fn reconcile_recomputes_reserved_from_holding_reservations() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let ledger = ledger_over(repos.clone());
        ledger.set_total(&key(), 10).await.unwrap();
        ledger.try_reserve(&key(), 9).await.unwrap();

        for (code, chicken, status) in [
            ("AAAAAAAA", 2, ReservationStatus::Confirmed),
            ("BBBBBBBB", 1, ReservationStatus::Pending),
            ("CCCCCCCC", 4, ReservationStatus::Cancelled),
        ] {
            repos.commit(WriteSet::insert(held(code, chicken, status))).await.unwrap();
        }

        assert_eq!(ledger.reconcile_from(key().date).await.unwrap(), 1);
        let snap = ledger.read(&key()).await.unwrap();
        assert_eq!(snap.reserved_units, 3);
        assert_eq!(snap.available_units, Some(7));

        assert_eq!(ledger.reconcile_from(key().date).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reconcile_leaves_earlier_days_alone() {
        let ledger = ledger();
        ledger.set_total(&key(), 10).await.unwrap();
        ledger.try_reserve(&key(), 5).await.unwrap();

        let tomorrow = key().date.succ_opt().unwrap();
        assert_eq!(ledger.reconcile_from(tomorrow).await.unwrap(), 0);
        assert_eq!(ledger.read(&key()).await.unwrap().reserved_units, 5);
    }
}
