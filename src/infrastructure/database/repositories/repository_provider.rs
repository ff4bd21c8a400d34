//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::domain::inventory::InventoryRepository;
use crate::domain::repositories::{RepositoryProvider, WriteSet};
use crate::domain::reservation::ReservationRepository;
use crate::domain::{DomainError, DomainResult};
use crate::shared::errors::InfraError;

use super::inventory_repository::{upsert_row, SeaOrmInventoryRepository};
use super::reservation_repository::{insert_row, update_row, SeaOrmReservationRepository};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let row = repos.inventory().find(&key).await?;
/// let r = repos.reservations().find_by_code(&code).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    inventory: SeaOrmInventoryRepository,
    reservations: SeaOrmReservationRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            inventory: SeaOrmInventoryRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn inventory(&self) -> &dyn InventoryRepository {
        &self.inventory
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    /// One SQLite transaction per write set. Returning early drops the
    /// transaction, which rolls it back.
    async fn commit(&self, writes: WriteSet) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        if let Some(r) = writes.insert {
            insert_row(&txn, r).await?;
        }
        if let Some(r) = &writes.update {
            update_row(&txn, r).await?;
        }
        if let Some(row) = writes.inventory {
            upsert_row(&txn, row).await?;
        }
        txn.commit().await.map_err(db_err)
    }

    async fn ping(&self) -> DomainResult<()> {
        self.db.ping().await.map_err(db_err)
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::Database(e).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::{DailyInventory, LedgerKey};
    use crate::domain::reservation::{
        ConfirmationCode, NewReservation, Reservation, ReservationStatus,
    };
    use crate::infrastructure::database::{init_database, run_migrations, DatabaseConfig};
    use chrono::{NaiveDate, NaiveTime};

    async fn provider() -> SeaOrmRepositoryProvider {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();
        SeaOrmRepositoryProvider::new(db)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn reservation(code: &str) -> Reservation {
        Reservation::confirmed(
            NewReservation {
                location_id: "market".into(),
                reservation_date: day(),
                customer_name: "Carol".into(),
                customer_email: Some("carol@example.com".into()),
                chicken_count: 2,
                fries_count: 1,
                pickup_time: NaiveTime::from_hms_opt(12, 15, 0),
                notes: None,
            },
            ConfirmationCode::parse(code),
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn ping_succeeds() {
        provider().await.ping().await.unwrap();
    }

    #[tokio::test]
    async fn inventory_upsert_keeps_unset_total_distinct_from_zero() {
        let repos = provider().await;
        let key = LedgerKey::new("market", day());
        assert!(repos.inventory().find(&key).await.unwrap().is_none());

        let mut row = DailyInventory::new(key.clone(), chrono::Utc::now());
        repos.inventory().upsert(row.clone()).await.unwrap();
        let stored = repos.inventory().find(&key).await.unwrap().unwrap();
        assert_eq!(stored.total_units, None);

        row.total_units = Some(0);
        repos.inventory().upsert(row.clone()).await.unwrap();
        assert_eq!(
            repos.inventory().find(&key).await.unwrap().unwrap().total_units,
            Some(0)
        );

        row.total_units = Some(12);
        row.reserved_units = 5;
        repos.inventory().upsert(row).await.unwrap();
        let stored = repos.inventory().find(&key).await.unwrap().unwrap();
        assert_eq!(stored.total_units, Some(12));
        assert_eq!(stored.reserved_units, 5);
    }

    #[tokio::test]
    async fn reservation_round_trip_and_code_conflict() {
        let repos = provider().await;
        let store = repos.reservations();
        let r = reservation("ABCDEFGH");
        store.insert(r.clone()).await.unwrap();

        let found = store
            .find_by_code(&ConfirmationCode::parse("abcdefgh"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, r.id);
        assert_eq!(found.pickup_time, r.pickup_time);
        assert_eq!(found.status, ReservationStatus::Confirmed);
        assert!(store.code_exists(&r.confirmation_code).await.unwrap());

        let err = store.insert(reservation("ABCDEFGH")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_changes_status_and_notes_only() {
        let repos = provider().await;
        let store = repos.reservations();
        let mut r = reservation("JKLMNPQR");
        store.insert(r.clone()).await.unwrap();

        r.status = ReservationStatus::NoShow;
        r.notes = Some("never came".into());
        r.chicken_count = 40;
        store.update(&r).await.unwrap();

        let found = store.find_by_id(&r.id).await.unwrap().unwrap();
        assert_eq!(found.status, ReservationStatus::NoShow);
        assert_eq!(found.notes.as_deref(), Some("never came"));
        assert_eq!(found.chicken_count, 2);

        let listed = store.list_by_location_and_date("market", day()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(store
            .list_by_date(day().succ_opt().unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn commit_applies_hold_and_insert_together() {
        let repos = provider().await;
        let key = LedgerKey::new("market", day());
        let mut row = DailyInventory::new(key.clone(), chrono::Utc::now());
        row.total_units = Some(10);
        row.reserved_units = 2;

        let r = reservation("STUVWXYZ");
        repos
            .commit(WriteSet::insert(r.clone()).with_inventory(Some(row)))
            .await
            .unwrap();
        assert_eq!(repos.inventory().find(&key).await.unwrap().unwrap().reserved_units, 2);
        assert!(repos.reservations().find_by_id(&r.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_commit_rolls_back_earlier_writes() {
        let repos = provider().await;
        let key = LedgerKey::new("market", day());
        let mut row = DailyInventory::new(key.clone(), chrono::Utc::now());
        row.total_units = Some(10);
        repos.inventory().upsert(row.clone()).await.unwrap();

        // The insert succeeds inside the transaction, then the update of an
        // unknown id fails.
        row.reserved_units = 2;
        let inserted = reservation("MNPQRSTU");
        let writes = WriteSet {
            insert: Some(inserted.clone()),
            update: Some(reservation("QRSTUVWX")),
            inventory: Some(row),
        };
        assert!(matches!(
            repos.commit(writes).await,
            Err(DomainError::NotFound { .. })
        ));

        assert!(repos.reservations().find_by_id(&inserted.id).await.unwrap().is_none());
        assert_eq!(repos.inventory().find(&key).await.unwrap().unwrap().reserved_units, 0);
    }

    #[tokio::test]
    async fn list_from_orders_rows_by_day() {
        let repos = provider().await;
        let next = day().succ_opt().unwrap();
        for (loc, date) in [("market", next), ("harbor", day()), ("market", day().pred_opt().unwrap())] {
            repos
                .inventory()
                .upsert(DailyInventory::new(LedgerKey::new(loc, date), chrono::Utc::now()))
                .await
                .unwrap();
        }
        let rows = repos.inventory().list_from(day()).await.unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["harbor@2024-06-03", "market@2024-06-04"]);
    }
}
