use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use trailway_core::{Clock, CoreError, CoreResult, SeatNumber, SeatState, SeatStatus, TripEvent, TripId};

use crate::registry::SeatRegistry;

/// A granted hold. `seq` is the sequence of the `SeatLocked` event it
/// produced, or of the last mutation when the caller already held the seat.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LockGrant {
    pub seat_number: SeatNumber,
    pub expires_at: DateTime<Utc>,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Released { seq: u64 },
    /// The seat was already free; nothing changed.
    AlreadyFree,
}

/// Grants, releases and expires seat holds.
///
/// Locks have a fixed lifetime and cannot be renewed. Locking a seat the
/// caller already holds returns the existing expiry untouched.
pub struct LockManager {
    registry: Arc<SeatRegistry>,
}

impl LockManager {
    pub fn new(registry: Arc<SeatRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SeatRegistry> {
        &self.registry
    }

    pub async fn lock(&self, trip_id: TripId, seat_number: SeatNumber, user_id: &str) -> CoreResult<LockGrant> {
        let channel = self.registry.channel(trip_id).await?;
        let settings = self.registry.settings();
        let mut trip = channel.enter().await;
        let now = self.registry.clock().now();

        match trip.ledger().get_status(seat_number)? {
            SeatStatus::Free => {}
            SeatStatus::Booked => return Err(CoreError::Conflict("seat booked".to_string())),
            SeatStatus::Locked { owner, expires_at } if owner == user_id => {
                if *expires_at > now {
                    return Ok(LockGrant {
                        seat_number,
                        expires_at: *expires_at,
                        seq: trip.seq(),
                    });
                }
                return Err(CoreError::Conflict("hold expired".to_string()));
            }
            SeatStatus::Locked { .. } => {
                return Err(CoreError::Conflict("seat held by another user".to_string()));
            }
        }

        let held = trip.ledger().active_holds(user_id, now);
        if held >= settings.max_seats_per_booking {
            warn!("User {} hit the hold limit on trip {} ({} seats)", user_id, trip_id, held);
            return Err(CoreError::Conflict("hold limit reached".to_string()));
        }

        let expires_at = now + settings.hold_duration;
        trip.ledger_mut().compare_and_set(
            seat_number,
            SeatState::Free,
            SeatStatus::Locked {
                owner: user_id.to_string(),
                expires_at,
            },
        )?;

        let seq = trip.publish(|seq| TripEvent::SeatLocked {
            trip_id,
            seq,
            seat_number,
            user_id: user_id.to_string(),
            expires_at,
        });

        info!("Seat {} on trip {} locked by {} until {}", seat_number, trip_id, user_id, expires_at);
        Ok(LockGrant {
            seat_number,
            expires_at,
            seq,
        })
    }

    pub async fn unlock(&self, trip_id: TripId, seat_number: SeatNumber, user_id: &str) -> CoreResult<UnlockOutcome> {
        let channel = self.registry.channel(trip_id).await?;
        let mut trip = channel.enter().await;

        match trip.ledger().get_status(seat_number)? {
            SeatStatus::Free => return Ok(UnlockOutcome::AlreadyFree),
            SeatStatus::Booked => return Err(CoreError::Conflict("seat booked".to_string())),
            SeatStatus::Locked { owner, .. } if owner != user_id => {
                return Err(CoreError::Forbidden("not the lock owner".to_string()));
            }
            SeatStatus::Locked { .. } => {}
        }

        trip.ledger_mut().compare_and_set(seat_number, SeatState::Locked, SeatStatus::Free)?;
        let seq = trip.publish(|seq| TripEvent::SeatUnlocked {
            trip_id,
            seq,
            seat_number,
            user_id: Some(user_id.to_string()),
        });

        info!("Seat {} on trip {} released by {}", seat_number, trip_id, user_id);
        Ok(UnlockOutcome::Released { seq })
    }

    /// Release every seat `user_id` holds on the trip. Returns the seats released.
    pub async fn release_all(&self, trip_id: TripId, user_id: &str) -> CoreResult<Vec<SeatNumber>> {
        let channel = self.registry.channel(trip_id).await?;
        let mut trip = channel.enter().await;

        let seats = trip.ledger().held_by(user_id);
        for seat_number in &seats {
            trip.ledger_mut().compare_and_set(*seat_number, SeatState::Locked, SeatStatus::Free)?;
            trip.publish(|seq| TripEvent::SeatUnlocked {
                trip_id,
                seq,
                seat_number: *seat_number,
                user_id: Some(user_id.to_string()),
            });
        }

        if !seats.is_empty() {
            info!("Released {} seats on trip {} held by {}", seats.len(), trip_id, user_id);
        }
        Ok(seats)
    }

    /// Free every lock whose expiry has passed, on every open trip, then drop
    /// idle channels. Returns the number of locks reclaimed.
    pub async fn sweep_expired(&self) -> usize {
        let mut reclaimed = 0;

        for channel in self.registry.channels().await {
            let mut trip = channel.enter().await;
            let now = self.registry.clock().now();
            let trip_id = channel.trip_id();

            for lock in trip.ledger().expired_locks(now) {
                if trip
                    .ledger_mut()
                    .compare_and_set(lock.seat_number, SeatState::Locked, SeatStatus::Free)
                    .is_err()
                {
                    continue;
                }
                trip.publish(|seq| TripEvent::SeatUnlocked {
                    trip_id,
                    seq,
                    seat_number: lock.seat_number,
                    user_id: None,
                });
                info!(
                    "Hold on seat {} of trip {} by {} expired",
                    lock.seat_number, trip_id, lock.owner_user_id
                );
                reclaimed += 1;
            }
        }

        self.registry.evict_idle().await;
        reclaimed
    }
}
