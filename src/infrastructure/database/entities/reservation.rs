//! Reservation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub confirmation_code: String,

    pub location_id: String,
    pub reservation_date: Date,

    pub customer_name: String,
    #[sea_orm(nullable)]
    pub customer_email: Option<String>,

    pub chicken_count: i64,
    pub fries_count: i64,

    #[sea_orm(nullable)]
    pub pickup_time: Option<Time>,
    #[sea_orm(nullable)]
    pub notes: Option<String>,

    /// PENDING, CONFIRMED, CANCELLED, COMPLETED, NO_SHOW
    pub status: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
