//! Read projections returned by the engine
//!
//! These are what callers see: reservations carry denormalized location
//! details and the computed `can_cancel` flag.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::inventory::{AvailabilityStatus, InventorySnapshot};
use crate::domain::location::Location;
use crate::domain::reservation::{Reservation, ReservationStatus};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub id: String,
    pub confirmation_code: String,
    pub location_id: String,
    pub location_name: String,
    pub location_address: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub chicken_count: u32,
    pub fries_count: u32,
    pub reservation_date: NaiveDate,
    pub pickup_time: Option<NaiveTime>,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub can_cancel: bool,
}

impl ReservationView {
    /// `location` may be missing if it was removed from configuration after
    /// the reservation was made; the id is then shown in place of the name.
    pub fn new(r: Reservation, location: Option<&Location>, today: NaiveDate) -> Self {
        let can_cancel = r.can_cancel(today);
        let (location_name, location_address) = match location {
            Some(l) => (l.name.clone(), l.address.clone()),
            None => (r.location_id.clone(), String::new()),
        };
        Self {
            id: r.id,
            confirmation_code: r.confirmation_code.into_string(),
            location_id: r.location_id,
            location_name,
            location_address,
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            chicken_count: r.chicken_count,
            fries_count: r.fries_count,
            reservation_date: r.reservation_date,
            pickup_time: r.pickup_time,
            status: r.status,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
            can_cancel,
        }
    }
}

/// Customer-facing availability for one location and day.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityView {
    pub location_id: String,
    pub location_name: String,
    pub date: NaiveDate,
    pub day_of_week: u8,
    pub day_name: String,
    pub is_open: bool,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    pub inventory_set: bool,
    pub total_units: Option<u32>,
    pub reserved_units: u32,
    pub available_units: Option<u32>,
    pub availability_status: AvailabilityStatus,
    pub message: Option<String>,
}

/// Units held per capacity-holding status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservedBreakdown {
    pub pending: u32,
    pub confirmed: u32,
    pub total: u32,
}

impl ReservedBreakdown {
    pub fn from_reservations(reservations: &[Reservation]) -> Self {
        reservations.iter().fold(Self::default(), |mut acc, r| {
            match r.status {
                ReservationStatus::Pending => acc.pending += r.chicken_count,
                ReservationStatus::Confirmed => acc.confirmed += r.chicken_count,
                _ => return acc,
            }
            acc.total += r.chicken_count;
            acc
        })
    }
}

/// Staff-facing ledger view.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    pub location_id: String,
    pub location_name: String,
    pub date: NaiveDate,
    pub inventory_set: bool,
    pub total_units: Option<u32>,
    pub reserved_units: u32,
    pub available_units: Option<u32>,
    pub utilization_percent: f64,
    /// Units held by the day's reservations, by status.
    pub reserved: ReservedBreakdown,
    /// Reservations of any status for the day.
    pub reservation_count: u64,
    pub status: AvailabilityStatus,
    pub message: Option<String>,
}

impl InventoryView {
    pub fn new(
        location: &Location,
        snapshot: InventorySnapshot,
        reservations: &[Reservation],
        status: AvailabilityStatus,
    ) -> Self {
        let message = (!snapshot.inventory_set)
            .then(|| "Please enter today's stock".to_string());
        Self {
            location_id: location.id.clone(),
            location_name: location.name.clone(),
            date: snapshot.date,
            inventory_set: snapshot.inventory_set,
            total_units: snapshot.total_units,
            reserved_units: snapshot.reserved_units,
            available_units: snapshot.available_units,
            utilization_percent: snapshot.utilization_percent,
            reserved: ReservedBreakdown::from_reservations(reservations),
            reservation_count: reservations.len() as u64,
            status,
            message,
        }
    }
}
