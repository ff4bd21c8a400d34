//! Daily inventory entity (capacity ledger rows)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub location_id: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,

    /// NULL until staff enters the day's stock
    #[sea_orm(nullable)]
    pub total_units: Option<i64>,

    pub reserved_units: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
