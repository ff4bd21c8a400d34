//! Inventory repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{DailyInventory, LedgerKey};
use crate::shared::errors::DomainResult;

/// Persistence for ledger rows.
///
/// Implementations are plain storage; admission control and the
/// read-modify-write sequence live in the capacity ledger, which holds the
/// per-key lock around every call that mutates a row.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn find(&self, key: &LedgerKey) -> DomainResult<Option<DailyInventory>>;

    /// Insert or overwrite the row for `inventory.key`.
    async fn upsert(&self, inventory: DailyInventory) -> DomainResult<()>;

    /// Rows dated `from` or later, across locations.
    async fn list_from(&self, from: NaiveDate) -> DomainResult<Vec<DailyInventory>>;
}
