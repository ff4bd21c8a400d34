//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::debug;

use crate::domain::reservation::{
    ConfirmationCode, Reservation, ReservationRepository, ReservationStatus,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::reservation;
use crate::shared::errors::InfraError;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn count(value: i64, column: &str) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::Internal(format!("corrupt {} value {}", column, value)))
}

fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    let status: ReservationStatus = m.status.parse().map_err(DomainError::Internal)?;
    Ok(Reservation {
        id: m.id,
        confirmation_code: ConfirmationCode::parse(&m.confirmation_code),
        location_id: m.location_id,
        reservation_date: m.reservation_date,
        customer_name: m.customer_name,
        customer_email: m.customer_email,
        chicken_count: count(m.chicken_count, "chicken_count")?,
        fries_count: count(m.fries_count, "fries_count")?,
        pickup_time: m.pickup_time,
        notes: m.notes,
        status,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn models_to_domain(models: Vec<reservation::Model>) -> DomainResult<Vec<Reservation>> {
    models.into_iter().map(model_to_domain).collect()
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::Database(e).into()
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn insert(&self, r: Reservation) -> DomainResult<()> {
        insert_row(&self.db, r).await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_code(&self, code: &ConfirmationCode) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::ConfirmationCode.eq(code.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn code_exists(&self, code: &ConfirmationCode) -> DomainResult<bool> {
        let n = reservation::Entity::find()
            .filter(reservation::Column::ConfirmationCode.eq(code.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(n > 0)
    }

    async fn update(&self, r: &Reservation) -> DomainResult<()> {
        update_row(&self.db, r).await
    }

    async fn list_by_location_and_date(
        &self,
        location_id: &str,
        date: NaiveDate,
    ) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::LocationId.eq(location_id))
            .filter(reservation::Column::ReservationDate.eq(date))
            .order_by_asc(reservation::Column::CreatedAt)
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn list_by_date(&self, date: NaiveDate) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::ReservationDate.eq(date))
            .order_by_asc(reservation::Column::CreatedAt)
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }
}

// ── Connection-generic writes ───────────────────────────────────

/// Insert on any connection, including an open transaction. A taken id or
/// confirmation code maps to `Conflict`.
pub(super) async fn insert_row<C: ConnectionTrait>(conn: &C, r: Reservation) -> DomainResult<()> {
    debug!(id = %r.id, code = %r.confirmation_code, "Inserting reservation");

    let model = reservation::ActiveModel {
        id: Set(r.id),
        confirmation_code: Set(r.confirmation_code.into_string()),
        location_id: Set(r.location_id),
        reservation_date: Set(r.reservation_date),
        customer_name: Set(r.customer_name),
        customer_email: Set(r.customer_email),
        chicken_count: Set(i64::from(r.chicken_count)),
        fries_count: Set(i64::from(r.fries_count)),
        pickup_time: Set(r.pickup_time),
        notes: Set(r.notes),
        status: Set(r.status.as_str().to_string()),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
    };
    match model.insert(conn).await {
        Ok(_) => Ok(()),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Err(DomainError::Conflict(detail)),
            _ => Err(db_err(e)),
        },
    }
}

/// Persist status, notes and `updated_at`; other columns are left alone.
pub(super) async fn update_row<C: ConnectionTrait>(conn: &C, r: &Reservation) -> DomainResult<()> {
    debug!(id = %r.id, status = %r.status, "Updating reservation");

    let existing = reservation::Entity::find_by_id(r.id.clone())
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Reservation", "id", r.id.as_str()))?;

    let mut model: reservation::ActiveModel = existing.into();
    model.status = Set(r.status.as_str().to_string());
    model.notes = Set(r.notes.clone());
    model.updated_at = Set(r.updated_at);
    model.update(conn).await.map_err(db_err)?;
    Ok(())
}
