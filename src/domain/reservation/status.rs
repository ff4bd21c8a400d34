//! Reservation status state machine

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of a reservation.
///
/// ```text
///   PENDING ──► CONFIRMED ──► COMPLETED
///      │            ├───────► NO_SHOW
///      └────────────┴───────► CANCELLED
/// ```
///
/// New reservations start as `Confirmed`; `Pending` is only reachable
/// through data written by a two-phase flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Source state is terminal.
    AlreadyFinalized,
    /// Pair is not in the transition table.
    NotAllowed,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
        Self::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
            Self::NoShow => "NO_SHOW",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::NoShow)
    }

    /// Whether a reservation in this state counts toward `reserved_units`.
    pub fn holds_capacity(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Status-only half of the cancellability rule; the date half lives on
    /// [`Reservation::can_cancel`](super::Reservation::can_cancel).
    pub fn allows_cancel(&self) -> bool {
        self.holds_capacity()
    }

    /// The transition table. Anything not listed is refused.
    pub fn transition(self, to: ReservationStatus) -> Result<ReservationStatus, TransitionError> {
        use ReservationStatus::*;

        if self.is_terminal() {
            return Err(TransitionError::AlreadyFinalized);
        }
        match (self, to) {
            (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Completed)
            | (Confirmed, NoShow)
            | (Confirmed, Cancelled) => Ok(to),
            _ => Err(TransitionError::NotAllowed),
        }
    }

    /// Whether moving `self → to` returns the held units to the pool.
    pub fn releases_on(self, to: ReservationStatus) -> bool {
        self.holds_capacity() && !to.holds_capacity()
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown reservation status '{}'", s))
    }
}
