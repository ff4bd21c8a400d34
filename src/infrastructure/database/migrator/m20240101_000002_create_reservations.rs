//! Create reservations table
//!
//! Customer pickup orders. Confirmation codes are unique; staff listings
//! filter by location, day and status.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Reservations::ConfirmationCode)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Reservations::LocationId).string().not_null())
                    .col(ColumnDef::new(Reservations::ReservationDate).date().not_null())
                    .col(
                        ColumnDef::new(Reservations::CustomerName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::CustomerEmail).string_len(255))
                    .col(
                        ColumnDef::new(Reservations::ChickenCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Reservations::FriesCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Reservations::PickupTime).time())
                    .col(ColumnDef::new(Reservations::Notes).string_len(500))
                    .col(
                        ColumnDef::new(Reservations::Status)
                            .string()
                            .not_null()
                            .default("CONFIRMED"),
                    )
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_location_date_status")
                    .table(Reservations::Table)
                    .col(Reservations::LocationId)
                    .col(Reservations::ReservationDate)
                    .col(Reservations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_date")
                    .table(Reservations::Table)
                    .col(Reservations::ReservationDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    ConfirmationCode,
    LocationId,
    ReservationDate,
    CustomerName,
    CustomerEmail,
    ChickenCount,
    FriesCount,
    PickupTime,
    Notes,
    Status,
    CreatedAt,
    UpdatedAt,
}
