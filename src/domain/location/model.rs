//! Location entity and opening hours

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Opening window for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    /// ISO weekday: 1 = Monday .. 7 = Sunday
    pub day_of_week: u8,
    #[serde(with = "clock_time")]
    pub opening_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub closing_time: NaiveTime,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl OpeningHours {
    /// Inclusive on both ends.
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.opening_time && time <= self.closing_time
    }
}

/// A place the truck parks on certain weekdays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub schedule: Vec<OpeningHours>,
}

impl Location {
    /// Active opening window for the weekday of `date`, if the location
    /// operates that day.
    pub fn hours_on(&self, date: NaiveDate) -> Option<&OpeningHours> {
        let day = iso_weekday(date.weekday());
        self.schedule
            .iter()
            .find(|h| h.active && h.day_of_week == day)
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.active && self.hours_on(date).is_some()
    }
}

pub fn iso_weekday(weekday: Weekday) -> u8 {
    weekday.number_from_monday() as u8
}

/// English display name for an ISO weekday number.
pub fn weekday_name(day_of_week: u8) -> &'static str {
    match day_of_week {
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        7 => "Sunday",
        _ => "Unknown",
    }
}

/// `"HH:MM"` (seconds accepted on input).
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|_| format!("invalid time '{}', expected HH:MM", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn market() -> Location {
        Location {
            id: "market".into(),
            name: "Market Square".into(),
            address: "Marktplatz 1".into(),
            latitude: None,
            longitude: None,
            active: true,
            schedule: vec![
                OpeningHours {
                    day_of_week: 1,
                    opening_time: t(11, 0),
                    closing_time: t(14, 0),
                    active: true,
                },
                OpeningHours {
                    day_of_week: 3,
                    opening_time: t(11, 0),
                    closing_time: t(14, 0),
                    active: false,
                },
            ],
        }
    }

    #[test]
    fn window_is_inclusive() {
        let hours = &market().schedule[0];
        assert!(hours.contains(t(11, 0)));
        assert!(hours.contains(t(14, 0)));
        assert!(!hours.contains(t(10, 59)));
        assert!(!hours.contains(t(14, 1)));
    }

    #[test]
    fn hours_follow_weekday() {
        let loc = market();
        // 2024-06-03 is a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert!(loc.is_open_on(monday));
        assert!(!loc.is_open_on(tuesday));
        // inactive schedule entry
        assert!(!loc.is_open_on(wednesday));
    }

    #[test]
    fn inactive_location_is_never_open() {
        let mut loc = market();
        loc.active = false;
        assert!(!loc.is_open_on(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
    }

    #[test]
    fn clock_time_accepts_minutes_and_seconds() {
        assert_eq!(clock_time::parse("11:30"), Ok(t(11, 30)));
        assert_eq!(clock_time::parse("11:30:00"), Ok(t(11, 30)));
        assert!(clock_time::parse("25:00").is_err());

        let hours: OpeningHours =
            serde_json::from_str(r#"{"day_of_week":2,"opening_time":"11:00","closing_time":"14:30"}"#)
                .unwrap();
        assert!(hours.active);
        assert_eq!(hours.closing_time, t(14, 30));
        let json = serde_json::to_string(&hours).unwrap();
        assert!(json.contains(r#""opening_time":"11:00""#));
    }

    #[test]
    fn weekday_names() {
        assert_eq!(weekday_name(1), "Monday");
        assert_eq!(weekday_name(7), "Sunday");
        assert_eq!(weekday_name(9), "Unknown");
    }
}
