//! Reservation domain entity

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::code::ConfirmationCode;
use super::status::ReservationStatus;

/// A validated request ready to be admitted.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub location_id: String,
    pub reservation_date: NaiveDate,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub chicken_count: u32,
    pub fries_count: u32,
    pub pickup_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

/// A customer's pickup order. Product counts and customer identity never
/// change after creation; only status and notes do.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: String,
    pub confirmation_code: ConfirmationCode,
    pub location_id: String,
    pub reservation_date: NaiveDate,
    pub customer_name: String,
    pub customer_email: Option<String>,
    /// Capacity-limited product; counted against the ledger.
    pub chicken_count: u32,
    /// Unlimited product; never checked against the ledger.
    pub fries_count: u32,
    pub pickup_time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Materialize an admitted request as a confirmed reservation.
    pub fn confirmed(request: NewReservation, code: ConfirmationCode, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            confirmation_code: code,
            location_id: request.location_id,
            reservation_date: request.reservation_date,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            chicken_count: request.chicken_count,
            fries_count: request.fries_count,
            pickup_time: request.pickup_time,
            notes: request.notes,
            status: ReservationStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Units this reservation currently holds in the ledger.
    pub fn held_units(&self) -> u32 {
        if self.status.holds_capacity() {
            self.chicken_count
        } else {
            0
        }
    }

    /// Cancellable while still holding capacity and the reservation day has
    /// not fully passed.
    pub fn can_cancel(&self, today: NaiveDate) -> bool {
        self.status.allows_cancel() && self.reservation_date >= today
    }
}
