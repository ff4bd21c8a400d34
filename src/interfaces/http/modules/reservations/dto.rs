//! Reservation DTOs

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::CreateReservation;
use crate::domain::location::model::clock_time;
use crate::domain::ReservationStatus;
use crate::shared::errors::DomainError;

/// Request to book a same-day pickup
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[validate(length(min = 1, max = 100))]
    pub location_id: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub customer_name: String,
    #[validate(email(message = "invalid email format"), length(max = 255))]
    pub customer_email: Option<String>,
    #[serde(default)]
    #[validate(range(max = 50, message = "must be between 0 and 50"))]
    pub chicken_count: u32,
    #[serde(default)]
    #[validate(range(max = 50, message = "must be between 0 and 50"))]
    pub fries_count: u32,
    /// Pickup time, `HH:MM`
    #[schema(example = "12:30")]
    pub pickup_time: Option<String>,
    #[validate(length(max = 500, message = "must not exceed 500 characters"))]
    pub notes: Option<String>,
}

impl CreateReservationRequest {
    pub fn into_command(self) -> Result<CreateReservation, DomainError> {
        let pickup_time: Option<NaiveTime> = self
            .pickup_time
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(clock_time::parse)
            .transpose()
            .map_err(DomainError::Validation)?;
        Ok(CreateReservation {
            location_id: self.location_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            chicken_count: self.chicken_count,
            fries_count: self.fries_count,
            pickup_time,
            notes: self.notes,
        })
    }
}

/// Staff status change
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: ReservationStatus,
    #[validate(length(max = 500, message = "must not exceed 500 characters"))]
    pub notes: Option<String>,
}

/// Reservations for one location and day
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StaffReservationQuery {
    pub location_id: String,
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// Reservations for a day, optionally for one location
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AdminReservationQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub location_id: Option<String>,
}
