use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SeatNumber, TripId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedSeat {
    pub seat_number: SeatNumber,
    pub user_id: UserId,
}

/// Messages delivered on a trip channel.
///
/// `seq` is the per-trip mutation sequence. For `InitialState` it is the
/// sequence of the last mutation the snapshot reflects; every later event on
/// the same channel carries a strictly greater value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripEvent {
    InitialState {
        trip_id: TripId,
        seq: u64,
        locked_seats: Vec<LockedSeat>,
        booked_seats: Vec<SeatNumber>,
    },
    SeatLocked {
        trip_id: TripId,
        seq: u64,
        seat_number: SeatNumber,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    },
    /// `user_id` is the releasing user, or absent when the hold expired.
    SeatUnlocked {
        trip_id: TripId,
        seq: u64,
        seat_number: SeatNumber,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
    },
    SeatBooked {
        trip_id: TripId,
        seq: u64,
        seat_numbers: Vec<SeatNumber>,
        booking_number: String,
    },
}

impl TripEvent {
    pub fn seq(&self) -> u64 {
        match self {
            TripEvent::InitialState { seq, .. }
            | TripEvent::SeatLocked { seq, .. }
            | TripEvent::SeatUnlocked { seq, .. }
            | TripEvent::SeatBooked { seq, .. } => *seq,
        }
    }

    pub fn trip_id(&self) -> TripId {
        match self {
            TripEvent::InitialState { trip_id, .. }
            | TripEvent::SeatLocked { trip_id, .. }
            | TripEvent::SeatUnlocked { trip_id, .. }
            | TripEvent::SeatBooked { trip_id, .. } => *trip_id,
        }
    }

    /// Wire name, also used as the SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            TripEvent::InitialState { .. } => "INITIAL_STATE",
            TripEvent::SeatLocked { .. } => "SEAT_LOCKED",
            TripEvent::SeatUnlocked { .. } => "SEAT_UNLOCKED",
            TripEvent::SeatBooked { .. } => "SEAT_BOOKED",
        }
    }
}

/// Published to Kafka once a booking is durable.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_number: String,
    pub trip_id: TripId,
    pub user_id: UserId,
    pub seat_numbers: Vec<SeatNumber>,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_type_tagged() {
        let event = TripEvent::SeatUnlocked {
            trip_id: 3,
            seq: 12,
            seat_number: 9,
            user_id: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SEAT_UNLOCKED");
        assert_eq!(json["seat_number"], 9);
        assert!(json.get("user_id").is_none());
        assert_eq!(event.name(), "SEAT_UNLOCKED");

        let parsed: TripEvent = serde_json::from_str(
            r#"{"type":"SEAT_LOCKED","trip_id":3,"seq":4,"seat_number":7,"user_id":"a","expires_at":"2026-01-01T00:05:00Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.seq(), 4);
        assert_eq!(parsed.trip_id(), 3);
    }
}
