//! Create daily_inventory table
//!
//! One row per (location, date); `total_units` stays NULL until stock is
//! entered for the day.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailyInventory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DailyInventory::LocationId).string().not_null())
                    .col(ColumnDef::new(DailyInventory::Date).date().not_null())
                    .col(ColumnDef::new(DailyInventory::TotalUnits).big_integer())
                    .col(
                        ColumnDef::new(DailyInventory::ReservedUnits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DailyInventory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyInventory::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DailyInventory::LocationId)
                            .col(DailyInventory::Date),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyInventory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum DailyInventory {
    Table,
    LocationId,
    Date,
    TotalUnits,
    ReservedUnits,
    CreatedAt,
    UpdatedAt,
}
