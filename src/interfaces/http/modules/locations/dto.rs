//! Location catalog DTOs

use chrono::NaiveTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::location::{weekday_name, Location, OpeningHours};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHoursDto {
    pub day_of_week: u8,
    pub day_name: String,
    #[schema(value_type = String, example = "11:00")]
    #[serde(with = "crate::domain::location::model::clock_time")]
    pub opening_time: NaiveTime,
    #[schema(value_type = String, example = "14:00")]
    #[serde(with = "crate::domain::location::model::clock_time")]
    pub closing_time: NaiveTime,
}

impl From<&OpeningHours> for OpeningHoursDto {
    fn from(h: &OpeningHours) -> Self {
        Self {
            day_of_week: h.day_of_week,
            day_name: weekday_name(h.day_of_week).to_string(),
            opening_time: h.opening_time,
            closing_time: h.closing_time,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
    /// Active weekdays only, Monday first
    pub schedule: Vec<OpeningHoursDto>,
}

impl From<&Location> for LocationDto {
    fn from(l: &Location) -> Self {
        let mut schedule: Vec<OpeningHoursDto> = l
            .schedule
            .iter()
            .filter(|h| h.active)
            .map(OpeningHoursDto::from)
            .collect();
        schedule.sort_by_key(|h| h.day_of_week);
        Self {
            id: l.id.clone(),
            name: l.name.clone(),
            address: l.address.clone(),
            latitude: l.latitude,
            longitude: l.longitude,
            active: l.active,
            schedule,
        }
    }
}

/// One location's stop on a given weekday.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledStopDto {
    pub location_id: String,
    pub location_name: String,
    pub address: String,
    #[schema(value_type = String, example = "11:00")]
    #[serde(with = "crate::domain::location::model::clock_time")]
    pub opening_time: NaiveTime,
    #[schema(value_type = String, example = "14:00")]
    #[serde(with = "crate::domain::location::model::clock_time")]
    pub closing_time: NaiveTime,
}

impl ScheduledStopDto {
    pub fn new(location: &Location, hours: &OpeningHours) -> Self {
        Self {
            location_id: location.id.clone(),
            location_name: location.name.clone(),
            address: location.address.clone(),
            opening_time: hours.opening_time,
            closing_time: hours.closing_time,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyScheduleDayDto {
    pub day_of_week: u8,
    pub day_name: String,
    pub stops: Vec<ScheduledStopDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_days_are_hidden_and_days_sorted() {
        let hours = |day, active| OpeningHours {
            day_of_week: day,
            opening_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            active,
        };
        let location = Location {
            id: "market".into(),
            name: "Market Square".into(),
            address: "Marktplatz 1".into(),
            latitude: None,
            longitude: None,
            active: true,
            schedule: vec![hours(5, true), hours(3, false), hours(1, true)],
        };

        let dto = LocationDto::from(&location);
        let days: Vec<u8> = dto.schedule.iter().map(|h| h.day_of_week).collect();
        assert_eq!(days, vec![1, 5]);

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["schedule"][0]["dayName"], "Monday");
        assert_eq!(json["schedule"][0]["closingTime"], "14:30");
    }
}
