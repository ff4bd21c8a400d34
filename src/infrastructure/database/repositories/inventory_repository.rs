//! SeaORM implementation of InventoryRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::domain::inventory::{DailyInventory, InventoryRepository, LedgerKey};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::daily_inventory;
use crate::shared::errors::InfraError;

pub struct SeaOrmInventoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmInventoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn units(value: i64, column: &str) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::Internal(format!("corrupt {} value {}", column, value)))
}

fn model_to_domain(m: daily_inventory::Model) -> DomainResult<DailyInventory> {
    Ok(DailyInventory {
        key: LedgerKey::new(m.location_id, m.date),
        total_units: m.total_units.map(|t| units(t, "total_units")).transpose()?,
        reserved_units: units(m.reserved_units, "reserved_units")?,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::Database(e).into()
}

// ── InventoryRepository impl ────────────────────────────────────

#[async_trait]
impl InventoryRepository for SeaOrmInventoryRepository {
    async fn find(&self, key: &LedgerKey) -> DomainResult<Option<DailyInventory>> {
        let model = daily_inventory::Entity::find_by_id((key.location_id.clone(), key.date))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn upsert(&self, inv: DailyInventory) -> DomainResult<()> {
        upsert_row(&self.db, inv).await
    }

    async fn list_from(&self, from: NaiveDate) -> DomainResult<Vec<DailyInventory>> {
        let models = daily_inventory::Entity::find()
            .filter(daily_inventory::Column::Date.gte(from))
            .order_by_asc(daily_inventory::Column::Date)
            .order_by_asc(daily_inventory::Column::LocationId)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }
}

/// Upsert on any connection, including an open transaction.
pub(super) async fn upsert_row<C: ConnectionTrait>(conn: &C, inv: DailyInventory) -> DomainResult<()> {
    debug!(key = %inv.key, total = ?inv.total_units, reserved = inv.reserved_units, "Upserting ledger row");

    let model = daily_inventory::ActiveModel {
        location_id: Set(inv.key.location_id),
        date: Set(inv.key.date),
        total_units: Set(inv.total_units.map(i64::from)),
        reserved_units: Set(i64::from(inv.reserved_units)),
        created_at: Set(inv.created_at),
        updated_at: Set(inv.updated_at),
    };
    daily_inventory::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                daily_inventory::Column::LocationId,
                daily_inventory::Column::Date,
            ])
            .update_columns([
                daily_inventory::Column::TotalUnits,
                daily_inventory::Column::ReservedUnits,
                daily_inventory::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}
