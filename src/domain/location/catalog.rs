//! In-memory directory of configured locations

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use super::model::{Location, OpeningHours};
use crate::shared::errors::{DomainError, DomainResult};

/// Read-only lookup over the configured locations.
#[derive(Debug, Default)]
pub struct LocationCatalog {
    by_id: HashMap<String, Location>,
}

pub type SharedLocationCatalog = Arc<LocationCatalog>;

impl LocationCatalog {
    /// Build the catalog, rejecting duplicate ids and malformed schedules.
    pub fn new(locations: Vec<Location>) -> DomainResult<Self> {
        let mut by_id = HashMap::with_capacity(locations.len());
        for location in locations {
            validate_schedule(&location)?;
            if by_id.contains_key(&location.id) {
                return Err(DomainError::Validation(format!(
                    "duplicate location id '{}'",
                    location.id
                )));
            }
            by_id.insert(location.id.clone(), location);
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: &str) -> DomainResult<&Location> {
        self.by_id
            .get(id)
            .ok_or_else(|| DomainError::not_found("Location", "id", id))
    }

    /// Active locations sorted by name.
    pub fn active(&self) -> Vec<&Location> {
        let mut list: Vec<&Location> = self.by_id.values().filter(|l| l.active).collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Active locations that operate on `date`, sorted by name.
    pub fn open_on(&self, date: NaiveDate) -> Vec<&Location> {
        self.active()
            .into_iter()
            .filter(|l| l.is_open_on(date))
            .collect()
    }

    /// Active locations grouped by ISO weekday (only days with at least one
    /// location are returned).
    pub fn weekly(&self) -> Vec<(u8, Vec<(&Location, &OpeningHours)>)> {
        let active = self.active();
        (1..=7u8)
            .filter_map(|day| {
                let entries: Vec<_> = active
                    .iter()
                    .filter_map(|l| {
                        l.schedule
                            .iter()
                            .find(|h| h.active && h.day_of_week == day)
                            .map(|h| (*l, h))
                    })
                    .collect();
                (!entries.is_empty()).then_some((day, entries))
            })
            .collect()
    }
}

fn validate_schedule(location: &Location) -> DomainResult<()> {
    let mut seen = [false; 8];
    for hours in &location.schedule {
        if !(1..=7).contains(&hours.day_of_week) {
            return Err(DomainError::Validation(format!(
                "location '{}': day_of_week {} must be between 1 (Monday) and 7 (Sunday)",
                location.id, hours.day_of_week
            )));
        }
        if hours.opening_time >= hours.closing_time {
            return Err(DomainError::Validation(format!(
                "location '{}': opening time must be before closing time",
                location.id
            )));
        }
        let slot = &mut seen[hours.day_of_week as usize];
        if *slot {
            return Err(DomainError::Validation(format!(
                "location '{}': more than one schedule entry for day {}",
                location.id, hours.day_of_week
            )));
        }
        *slot = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn hours(day: u8, open: u32, close: u32) -> OpeningHours {
        OpeningHours {
            day_of_week: day,
            opening_time: NaiveTime::from_hms_opt(open, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(close, 0, 0).unwrap(),
            active: true,
        }
    }

    fn loc(id: &str, name: &str, schedule: Vec<OpeningHours>) -> Location {
        Location {
            id: id.into(),
            name: name.into(),
            address: "Street 1".into(),
            latitude: Some(48.1),
            longitude: Some(11.5),
            active: true,
            schedule,
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = LocationCatalog::new(vec![
            loc("a", "A", vec![]),
            loc("a", "B", vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_inverted_window() {
        let err = LocationCatalog::new(vec![loc("a", "A", vec![hours(1, 14, 11)])]).unwrap_err();
        assert!(err.to_string().contains("opening time"));
    }

    #[test]
    fn rejects_bad_weekday() {
        assert!(LocationCatalog::new(vec![loc("a", "A", vec![hours(8, 11, 14)])]).is_err());
        assert!(LocationCatalog::new(vec![loc("a", "A", vec![hours(0, 11, 14)])]).is_err());
    }

    #[test]
    fn unknown_location_is_not_found() {
        let catalog = LocationCatalog::new(vec![]).unwrap();
        assert!(matches!(
            catalog.get("nope"),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[test]
    fn weekly_groups_by_day_sorted_by_name() {
        let catalog = LocationCatalog::new(vec![
            loc("z", "Zoo", vec![hours(1, 11, 14)]),
            loc("a", "Altstadt", vec![hours(1, 11, 14), hours(5, 16, 20)]),
        ])
        .unwrap();

        let weekly = catalog.weekly();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].0, 1);
        let names: Vec<_> = weekly[0].1.iter().map(|(l, _)| l.name.as_str()).collect();
        assert_eq!(names, vec!["Altstadt", "Zoo"]);
        assert_eq!(weekly[1].0, 5);
    }

    #[test]
    fn open_on_filters_by_weekday() {
        let catalog = LocationCatalog::new(vec![
            loc("z", "Zoo", vec![hours(1, 11, 14)]),
            loc("a", "Altstadt", vec![hours(2, 11, 14)]),
        ])
        .unwrap();
        // Monday
        let open = catalog.open_on(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "z");
    }
}
