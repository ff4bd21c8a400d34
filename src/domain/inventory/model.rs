//! Ledger row and derived snapshot

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Composite ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub location_id: String,
    pub date: NaiveDate,
}

impl LedgerKey {
    pub fn new(location_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location_id: location_id.into(),
            date,
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.location_id, self.date)
    }
}

/// Stock of the capacity-limited product for one location and day.
///
/// `total_units` is `None` until staff enters the day's stock; that is a
/// different state from an entered stock of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyInventory {
    pub key: LedgerKey,
    pub total_units: Option<u32>,
    /// Sum of units held by PENDING/CONFIRMED reservations for the key.
    pub reserved_units: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyInventory {
    pub fn new(key: LedgerKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            total_units: None,
            reserved_units: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// `None` while inventory is unset; never negative.
    pub fn available_units(&self) -> Option<u32> {
        self.total_units
            .map(|total| total.saturating_sub(self.reserved_units))
    }

    /// Admission check for `units` more units.
    pub fn can_hold(&self, units: u32) -> bool {
        self.available_units().is_some_and(|available| available >= units)
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot::from(self)
    }
}

/// Point-in-time view of a ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub location_id: String,
    pub date: NaiveDate,
    pub inventory_set: bool,
    pub total_units: Option<u32>,
    pub reserved_units: u32,
    pub available_units: Option<u32>,
    /// reserved / total × 100, one decimal place
    pub utilization_percent: f64,
}

impl InventorySnapshot {
    /// Snapshot for a key that has no ledger row yet.
    pub fn unset(key: &LedgerKey) -> Self {
        Self {
            location_id: key.location_id.clone(),
            date: key.date,
            inventory_set: false,
            total_units: None,
            reserved_units: 0,
            available_units: None,
            utilization_percent: 0.0,
        }
    }
}

impl From<&DailyInventory> for InventorySnapshot {
    fn from(inv: &DailyInventory) -> Self {
        let utilization_percent = match inv.total_units {
            Some(total) if total > 0 => {
                let raw = f64::from(inv.reserved_units) * 100.0 / f64::from(total);
                (raw * 10.0).round() / 10.0
            }
            _ => 0.0,
        };
        Self {
            location_id: inv.key.location_id.clone(),
            date: inv.key.date,
            inventory_set: inv.total_units.is_some(),
            total_units: inv.total_units,
            reserved_units: inv.reserved_units,
            available_units: inv.available_units(),
            utilization_percent,
        }
    }
}

/// Coarse availability classification shown to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    /// Location does not operate this weekday.
    Closed,
    /// Operates, but no stock entered yet.
    NotAvailable,
    SoldOut,
    AlmostFull,
    Limited,
    Available,
}

/// Ratios of available/total at or below which a day is classified as
/// almost full or limited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityThresholds {
    pub almost_full_ratio: f64,
    pub limited_ratio: f64,
}

impl Default for AvailabilityThresholds {
    fn default() -> Self {
        Self {
            almost_full_ratio: 0.15,
            limited_ratio: 0.40,
        }
    }
}

impl AvailabilityThresholds {
    pub fn is_valid(&self) -> bool {
        self.almost_full_ratio > 0.0
            && self.almost_full_ratio < self.limited_ratio
            && self.limited_ratio < 1.0
    }

    /// Classify a day whose inventory has been entered.
    pub fn classify(&self, available: u32, total: u32) -> AvailabilityStatus {
        if available == 0 || total == 0 {
            return AvailabilityStatus::SoldOut;
        }
        let ratio = f64::from(available) / f64::from(total);
        if ratio <= self.almost_full_ratio {
            AvailabilityStatus::AlmostFull
        } else if ratio <= self.limited_ratio {
            AvailabilityStatus::Limited
        } else {
            AvailabilityStatus::Available
        }
    }

    /// Classify a snapshot; unset inventory is [`AvailabilityStatus::NotAvailable`].
    pub fn classify_snapshot(&self, snapshot: &InventorySnapshot) -> AvailabilityStatus {
        match (snapshot.available_units, snapshot.total_units) {
            (Some(available), Some(total)) => self.classify(available, total),
            _ => AvailabilityStatus::NotAvailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> LedgerKey {
        LedgerKey::new("market", NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
    }

    fn row(total: Option<u32>, reserved: u32) -> DailyInventory {
        let mut inv = DailyInventory::new(key(), Utc::now());
        inv.total_units = total;
        inv.reserved_units = reserved;
        inv
    }

    #[test]
    fn unset_inventory_has_no_availability() {
        let inv = row(None, 0);
        assert_eq!(inv.available_units(), None);
        assert!(!inv.can_hold(0));
        assert!(!inv.snapshot().inventory_set);
    }

    #[test]
    fn zero_stock_is_distinct_from_unset() {
        let inv = row(Some(0), 0);
        assert_eq!(inv.available_units(), Some(0));
        assert!(inv.snapshot().inventory_set);
    }

    #[test]
    fn available_never_negative_after_reduced_total() {
        let inv = row(Some(5), 8);
        assert_eq!(inv.available_units(), Some(0));
        assert!(!inv.can_hold(1));
    }

    #[test]
    fn utilization_rounds_to_one_decimal() {
        let snap = row(Some(3), 1).snapshot();
        assert_eq!(snap.utilization_percent, 33.3);
        assert_eq!(row(Some(0), 0).snapshot().utilization_percent, 0.0);
    }

    #[test]
    fn classification_bands() {
        let t = AvailabilityThresholds::default();
        assert_eq!(t.classify(0, 10), AvailabilityStatus::SoldOut);
        assert_eq!(t.classify(1, 10), AvailabilityStatus::AlmostFull);
        assert_eq!(t.classify(3, 20), AvailabilityStatus::AlmostFull);
        assert_eq!(t.classify(3, 10), AvailabilityStatus::Limited);
        assert_eq!(t.classify(4, 10), AvailabilityStatus::Limited);
        assert_eq!(t.classify(5, 10), AvailabilityStatus::Available);
        assert_eq!(t.classify(0, 0), AvailabilityStatus::SoldOut);
    }

    #[test]
    fn snapshot_classification_handles_unset() {
        let t = AvailabilityThresholds::default();
        assert_eq!(
            t.classify_snapshot(&InventorySnapshot::unset(&key())),
            AvailabilityStatus::NotAvailable
        );
        assert_eq!(
            t.classify_snapshot(&row(Some(10), 10).snapshot()),
            AvailabilityStatus::SoldOut
        );
    }

    #[test]
    fn threshold_ordering_is_validated() {
        assert!(AvailabilityThresholds::default().is_valid());
        let inverted = AvailabilityThresholds {
            almost_full_ratio: 0.5,
            limited_ratio: 0.2,
        };
        assert!(!inverted.is_valid());
    }
}
