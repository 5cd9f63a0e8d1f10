use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use trailway_core::{CoreError, LockedSeat, SeatLock, SeatNumber, SeatState, SeatStatus, TripId};

/// Authoritative seat table of one trip.
///
/// All writes go through [`SeatLedger::compare_and_set`]; the ledger itself
/// is not synchronized and is only reachable through the trip's critical
/// section.
#[derive(Debug, Clone)]
pub struct SeatLedger {
    trip_id: TripId,
    seats: BTreeMap<SeatNumber, SeatStatus>,
}

impl SeatLedger {
    /// Seats `1..=total_seats`, with `booked` already marked as booked.
    /// Booked numbers outside the trip's range are ignored.
    pub fn new(trip_id: TripId, total_seats: i32, booked: impl IntoIterator<Item = SeatNumber>) -> Self {
        let mut seats: BTreeMap<SeatNumber, SeatStatus> =
            (1..=total_seats).map(|n| (n, SeatStatus::Free)).collect();

        for seat in booked {
            if let Some(status) = seats.get_mut(&seat) {
                *status = SeatStatus::Booked;
            }
        }

        Self { trip_id, seats }
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    pub fn total_seats(&self) -> usize {
        self.seats.len()
    }

    pub fn get_status(&self, seat_number: SeatNumber) -> Result<&SeatStatus, LedgerError> {
        self.seats.get(&seat_number).ok_or(LedgerError::UnknownSeat {
            trip_id: self.trip_id,
            seat_number,
        })
    }

    /// Replace the status of `seat_number` with `new` if its current state is
    /// `expected`. Returns the previous status.
    ///
    /// Booked is terminal: no transition out of it is accepted.
    pub fn compare_and_set(
        &mut self,
        seat_number: SeatNumber,
        expected: SeatState,
        new: SeatStatus,
    ) -> Result<SeatStatus, LedgerError> {
        let trip_id = self.trip_id;
        let status = self
            .seats
            .get_mut(&seat_number)
            .ok_or(LedgerError::UnknownSeat { trip_id, seat_number })?;

        let actual = status.state();
        if actual != expected {
            return Err(LedgerError::Conflict {
                seat_number,
                expected,
                actual,
            });
        }
        if actual == SeatState::Booked && new != SeatStatus::Booked {
            return Err(LedgerError::Terminal { seat_number });
        }

        Ok(std::mem::replace(status, new))
    }

    pub fn locks(&self) -> impl Iterator<Item = SeatLock> + '_ {
        self.seats.iter().filter_map(move |(seat_number, status)| match status {
            SeatStatus::Locked { owner, expires_at } => Some(SeatLock {
                trip_id: self.trip_id,
                seat_number: *seat_number,
                owner_user_id: owner.clone(),
                expires_at: *expires_at,
            }),
            _ => None,
        })
    }

    pub fn locked_seats(&self) -> Vec<LockedSeat> {
        self.locks()
            .map(|lock| LockedSeat {
                seat_number: lock.seat_number,
                user_id: lock.owner_user_id,
            })
            .collect()
    }

    pub fn booked_seats(&self) -> Vec<SeatNumber> {
        self.seats_in(SeatState::Booked)
    }

    pub fn held_by(&self, user_id: &str) -> Vec<SeatNumber> {
        self.seats
            .iter()
            .filter(|(_, status)| status.is_held_by(user_id))
            .map(|(n, _)| *n)
            .collect()
    }

    /// Unexpired locks owned by `user_id`. A lapsed hold that the sweeper has
    /// not reached yet does not count.
    pub fn active_holds(&self, user_id: &str, now: DateTime<Utc>) -> usize {
        self.locks()
            .filter(|lock| lock.owner_user_id == user_id && !lock.is_expired(now))
            .count()
    }

    /// Locks whose `expires_at` is at or before `now`.
    pub fn expired_locks(&self, now: DateTime<Utc>) -> Vec<SeatLock> {
        self.locks().filter(|lock| lock.is_expired(now)).collect()
    }

    pub fn has_locks(&self) -> bool {
        self.seats.values().any(|s| s.state() == SeatState::Locked)
    }

    pub fn free_count(&self) -> usize {
        self.seats.values().filter(|s| s.state() == SeatState::Free).count()
    }

    fn seats_in(&self, state: SeatState) -> Vec<SeatNumber> {
        self.seats
            .iter()
            .filter(|(_, status)| status.state() == state)
            .map(|(n, _)| *n)
            .collect()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Seat {seat_number} does not exist on trip {trip_id}")]
    UnknownSeat { trip_id: TripId, seat_number: SeatNumber },

    #[error("Seat {seat_number} is {actual}, expected {expected}")]
    Conflict {
        seat_number: SeatNumber,
        expected: SeatState,
        actual: SeatState,
    },

    #[error("Seat {seat_number} is booked")]
    Terminal { seat_number: SeatNumber },
}

impl From<LedgerError> for CoreError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownSeat { .. } => CoreError::NotFound(err.to_string()),
            LedgerError::Conflict { .. } | LedgerError::Terminal { .. } => CoreError::Conflict(err.to_string()),
        }
    }
}
