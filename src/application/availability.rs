//! Availability projector
//!
//! Read-only composition of the location schedule and the ledger snapshot.
//! Never takes a ledger lock.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::ledger::CapacityLedger;
use super::views::{AvailabilityView, InventoryView};
use crate::domain::inventory::{AvailabilityStatus, AvailabilityThresholds, LedgerKey};
use crate::domain::location::{iso_weekday, weekday_name, Location, SharedLocationCatalog};
use crate::domain::{Actor, RepositoryProvider};
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::time::SharedClock;

pub struct AvailabilityProjector {
    repos: Arc<dyn RepositoryProvider>,
    ledger: Arc<CapacityLedger>,
    catalog: SharedLocationCatalog,
    clock: SharedClock,
    thresholds: AvailabilityThresholds,
}

pub type SharedAvailabilityProjector = Arc<AvailabilityProjector>;

impl AvailabilityProjector {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        ledger: Arc<CapacityLedger>,
        catalog: SharedLocationCatalog,
        clock: SharedClock,
        thresholds: AvailabilityThresholds,
    ) -> Self {
        Self {
            repos,
            ledger,
            catalog,
            clock,
            thresholds,
        }
    }

    /// Classified availability for a location on `date` (today if omitted).
    pub async fn get_availability(
        &self,
        location_id: &str,
        date: Option<NaiveDate>,
    ) -> DomainResult<AvailabilityView> {
        let location = self.catalog.get(location_id)?;
        let date = date.unwrap_or_else(|| self.clock.today());
        let day_of_week = iso_weekday(date.weekday());
        let hours = location.hours_on(date).filter(|_| location.active);

        let snapshot = self
            .ledger
            .read(&LedgerKey::new(location.id.clone(), date))
            .await?;

        let status = if hours.is_some() {
            self.thresholds.classify_snapshot(&snapshot)
        } else {
            AvailabilityStatus::Closed
        };
        debug!(location = %location.id, %date, ?status, "Availability projected");

        Ok(AvailabilityView {
            location_id: location.id.clone(),
            location_name: location.name.clone(),
            date,
            day_of_week,
            day_name: weekday_name(day_of_week).to_string(),
            is_open: hours.is_some(),
            opening_time: hours.map(|h| h.opening_time),
            closing_time: hours.map(|h| h.closing_time),
            inventory_set: snapshot.inventory_set,
            total_units: snapshot.total_units,
            reserved_units: snapshot.reserved_units,
            available_units: snapshot.available_units,
            availability_status: status,
            message: Some(status_message(status, snapshot.available_units, location)),
        })
    }

    /// Staff view of the ledger for one location and day.
    pub async fn inventory(
        &self,
        location_id: &str,
        date: Option<NaiveDate>,
        actor: &Actor,
    ) -> DomainResult<InventoryView> {
        if !actor.is_staff() {
            return Err(DomainError::Forbidden(format!(
                "{} may not view inventory",
                actor.name
            )));
        }
        let location = self.catalog.get(location_id)?;
        let date = date.unwrap_or_else(|| self.clock.today());
        let snapshot = self
            .ledger
            .read(&LedgerKey::new(location.id.clone(), date))
            .await?;
        let reservations = self
            .repos
            .reservations()
            .list_by_location_and_date(&location.id, date)
            .await?;

        let status = if location.is_open_on(date) {
            self.thresholds.classify_snapshot(&snapshot)
        } else {
            AvailabilityStatus::Closed
        };
        Ok(InventoryView::new(location, snapshot, &reservations, status))
    }
}

fn status_message(status: AvailabilityStatus, available: Option<u32>, location: &Location) -> String {
    match status {
        AvailabilityStatus::Closed => format!("{} is closed on this day", location.name),
        AvailabilityStatus::NotAvailable => "Reservations are not open yet for this day".to_string(),
        AvailabilityStatus::SoldOut => "Sold out".to_string(),
        AvailabilityStatus::AlmostFull => {
            format!("Almost sold out, only {} left", available.unwrap_or(0))
        }
        AvailabilityStatus::Limited => format!("Limited availability, {} left", available.unwrap_or(0)),
        AvailabilityStatus::Available => format!("{} available", available.unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::locks::KeyedLocks;
    use crate::domain::location::{LocationCatalog, OpeningHours};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::FixedClock;
    use chrono::NaiveTime;
    use std::time::Duration;

    // Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    struct Fixture {
        projector: AvailabilityProjector,
        ledger: Arc<CapacityLedger>,
    }

    fn fixture() -> Fixture {
        let monday_hours = OpeningHours {
            day_of_week: 1,
            opening_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            active: true,
        };
        let catalog = Arc::new(
            LocationCatalog::new(vec![
                Location {
                    id: "market".into(),
                    name: "Market Square".into(),
                    address: "Marktplatz 1".into(),
                    latitude: Some(48.1),
                    longitude: Some(11.5),
                    active: true,
                    schedule: vec![monday_hours.clone()],
                },
                Location {
                    id: "retired".into(),
                    name: "Retired".into(),
                    address: "Alt 9".into(),
                    latitude: None,
                    longitude: None,
                    active: false,
                    schedule: vec![monday_hours],
                },
            ])
            .unwrap(),
        );
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let clock = Arc::new(FixedClock::new(monday().and_hms_opt(9, 0, 0).unwrap()));
        let ledger = Arc::new(CapacityLedger::new(
            repos.clone(),
            Arc::new(KeyedLocks::new(Duration::from_secs(1))),
            clock.clone(),
        ));
        Fixture {
            projector: AvailabilityProjector::new(
                repos,
                ledger.clone(),
                catalog,
                clock,
                AvailabilityThresholds::default(),
            ),
            ledger,
        }
    }

    fn key() -> LedgerKey {
        LedgerKey::new("market", monday())
    }

    #[tokio::test]
    async fn unset_inventory_is_not_available() {
        let f = fixture();
        let view = f.projector.get_availability("market", None).await.unwrap();
        assert_eq!(view.date, monday());
        assert_eq!(view.day_of_week, 1);
        assert_eq!(view.day_name, "Monday");
        assert!(view.is_open);
        assert!(!view.inventory_set);
        assert_eq!(view.availability_status, AvailabilityStatus::NotAvailable);
    }

    #[tokio::test]
    async fn closed_weekday_and_inactive_location() {
        let f = fixture();
        let tuesday = monday().succ_opt().unwrap();
        let view = f
            .projector
            .get_availability("market", Some(tuesday))
            .await
            .unwrap();
        assert_eq!(view.availability_status, AvailabilityStatus::Closed);
        assert!(!view.is_open);
        assert_eq!(view.opening_time, None);

        let view = f.projector.get_availability("retired", None).await.unwrap();
        assert_eq!(view.availability_status, AvailabilityStatus::Closed);
    }

    #[tokio::test]
    async fn classification_follows_ledger() {
        let f = fixture();
        f.ledger.set_total(&key(), 10).await.unwrap();
        let view = f.projector.get_availability("market", None).await.unwrap();
        assert_eq!(view.availability_status, AvailabilityStatus::Available);
        assert_eq!(view.opening_time, NaiveTime::from_hms_opt(11, 0, 0));

        f.ledger.try_reserve(&key(), 7).await.unwrap();
        let view = f.projector.get_availability("market", None).await.unwrap();
        assert_eq!(view.available_units, Some(3));
        assert_eq!(view.availability_status, AvailabilityStatus::Limited);

        f.ledger.try_reserve(&key(), 2).await.unwrap();
        let view = f.projector.get_availability("market", None).await.unwrap();
        assert_eq!(view.availability_status, AvailabilityStatus::AlmostFull);

        f.ledger.try_reserve(&key(), 1).await.unwrap();
        let view = f.projector.get_availability("market", None).await.unwrap();
        assert_eq!(view.availability_status, AvailabilityStatus::SoldOut);
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.projector.get_availability("nowhere", None).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn inventory_view_requires_staff_and_hints_when_unset() {
        let f = fixture();
        assert!(matches!(
            f.projector.inventory("market", None, &Actor::customer()).await,
            Err(DomainError::Forbidden(_))
        ));

        let view = f
            .projector
            .inventory("market", None, &Actor::staff("counter"))
            .await
            .unwrap();
        assert!(!view.inventory_set);
        assert_eq!(view.reservation_count, 0);
        assert!(view.message.is_some());

        f.ledger.set_total(&key(), 3).await.unwrap();
        f.ledger.try_reserve(&key(), 1).await.unwrap();
        let view = f
            .projector
            .inventory("market", None, &Actor::staff("counter"))
            .await
            .unwrap();
        assert_eq!(view.utilization_percent, 33.3);
        assert!(view.message.is_none());
    }
}
