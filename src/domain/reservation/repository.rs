//! Reservation repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::code::ConfirmationCode;
use super::model::Reservation;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation. Fails with `DomainError::Conflict` if the
    /// id or confirmation code is already taken.
    async fn insert(&self, reservation: Reservation) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>>;

    /// Lookup by normalized code.
    async fn find_by_code(&self, code: &ConfirmationCode) -> DomainResult<Option<Reservation>>;

    async fn code_exists(&self, code: &ConfirmationCode) -> DomainResult<bool>;

    /// Persist a status/notes change. Other fields are ignored.
    async fn update(&self, reservation: &Reservation) -> DomainResult<()>;

    /// All reservations for one location and day, oldest first.
    async fn list_by_location_and_date(
        &self,
        location_id: &str,
        date: NaiveDate,
    ) -> DomainResult<Vec<Reservation>>;

    /// All reservations for a day across locations, oldest first.
    async fn list_by_date(&self, date: NaiveDate) -> DomainResult<Vec<Reservation>>;
}
