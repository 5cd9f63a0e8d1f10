use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SeatNumber, TripId, UserId};

/// Status of one seat in a trip's ledger.
///
/// The lock metadata lives on the `Locked` variant, so a locked seat always
/// carries exactly one owner and one expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Free,
    Locked {
        owner: UserId,
        expires_at: DateTime<Utc>,
    },
    Booked,
}

impl SeatStatus {
    pub fn state(&self) -> SeatState {
        match self {
            SeatStatus::Free => SeatState::Free,
            SeatStatus::Locked { .. } => SeatState::Locked,
            SeatStatus::Booked => SeatState::Booked,
        }
    }

    pub fn is_held_by(&self, user_id: &str) -> bool {
        matches!(self, SeatStatus::Locked { owner, .. } if owner == user_id)
    }
}

/// Fieldless discriminant of [`SeatStatus`], used as the expected value of a
/// compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Free,
    Locked,
    Booked,
}

impl std::fmt::Display for SeatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatState::Free => write!(f, "FREE"),
            SeatState::Locked => write!(f, "LOCKED"),
            SeatState::Booked => write!(f, "BOOKED"),
        }
    }
}

/// An active hold, as read back out of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLock {
    pub trip_id: TripId,
    pub seat_number: SeatNumber,
    pub owner_user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl SeatLock {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
