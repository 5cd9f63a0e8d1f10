use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::debug;
use trailway_core::{TripEvent, TripId};

use crate::ledger::SeatLedger;

struct TripState {
    ledger: SeatLedger,
    seq: u64,
}

/// Broadcast domain and critical section of one trip.
pub struct TripChannel {
    trip_id: TripId,
    total_seats: i32,
    state: Mutex<TripState>,
    events: broadcast::Sender<TripEvent>,
}

/// A new subscriber's starting point: a snapshot plus every event after it.
pub struct Subscription {
    pub initial: TripEvent,
    pub receiver: broadcast::Receiver<TripEvent>,
}

/// Exclusive access to a trip's ledger. Dropping it leaves the critical section.
pub struct TripGuard<'a> {
    state: MutexGuard<'a, TripState>,
    events: &'a broadcast::Sender<TripEvent>,
}

impl TripChannel {
    pub fn new(ledger: SeatLedger, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            trip_id: ledger.trip_id(),
            total_seats: ledger.total_seats() as i32,
            state: Mutex::new(TripState { ledger, seq: 0 }),
            events,
        }
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    pub fn total_seats(&self) -> i32 {
        self.total_seats
    }

    /// Enter the trip's critical section.
    pub async fn enter(&self) -> TripGuard<'_> {
        TripGuard {
            state: self.state.lock().await,
            events: &self.events,
        }
    }

    /// Snapshot and receiver are taken inside the critical section, so the
    /// subscriber misses nothing and sees nothing twice.
    pub async fn subscribe(&self) -> Subscription {
        let guard = self.enter().await;
        let receiver = self.events.subscribe();
        let initial = TripEvent::InitialState {
            trip_id: self.trip_id,
            seq: guard.state.seq,
            locked_seats: guard.state.ledger.locked_seats(),
            booked_seats: guard.state.ledger.booked_seats(),
        };

        Subscription { initial, receiver }
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// True when nobody is subscribed and no seat is locked. Returns false if
    /// the critical section is currently held.
    pub(crate) fn is_idle(&self) -> bool {
        if self.subscriber_count() > 0 {
            return false;
        }
        match self.state.try_lock() {
            Ok(state) => !state.ledger.has_locks(),
            Err(_) => false,
        }
    }
}

impl TripGuard<'_> {
    pub fn ledger(&self) -> &SeatLedger {
        &self.state.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut SeatLedger {
        &mut self.state.ledger
    }

    pub fn seq(&self) -> u64 {
        self.state.seq
    }

    /// Assign the next sequence number and fan the event out. Delivery
    /// failures never fail the mutation that caused them.
    pub fn publish(&mut self, build: impl FnOnce(u64) -> TripEvent) -> u64 {
        self.state.seq += 1;
        let seq = self.state.seq;
        let event = build(seq);

        match self.events.send(event) {
            Ok(receivers) => debug!(seq, receivers, "trip event published"),
            Err(_) => debug!(seq, "trip event published with no subscribers"),
        }

        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use trailway_core::{LockedSeat, SeatState, SeatStatus};

    #[tokio::test]
    async fn test_subscription_starts_after_snapshot() {
        let channel = TripChannel::new(SeatLedger::new(5, 10, [3]), 16);

        {
            let mut trip = channel.enter().await;
            trip.ledger_mut()
                .compare_and_set(
                    9,
                    SeatState::Free,
                    SeatStatus::Locked {
                        owner: "a".to_string(),
                        expires_at: Utc::now() + Duration::minutes(5),
                    },
                )
                .unwrap();
            trip.publish(|seq| TripEvent::SeatUnlocked {
                trip_id: 5,
                seq,
                seat_number: 8,
                user_id: None,
            });
        }

        let mut sub = channel.subscribe().await;
        assert_eq!(
            sub.initial,
            TripEvent::InitialState {
                trip_id: 5,
                seq: 1,
                locked_seats: vec![LockedSeat { seat_number: 9, user_id: "a".to_string() }],
                booked_seats: vec![3],
            }
        );
        assert!(sub.receiver.try_recv().is_err());

        let seq = channel.enter().await.publish(|seq| TripEvent::SeatUnlocked {
            trip_id: 5,
            seq,
            seat_number: 9,
            user_id: Some("a".to_string()),
        });
        assert_eq!(seq, 2);
        assert_eq!(sub.receiver.recv().await.unwrap().seq(), 2);
    }

    #[tokio::test]
    async fn test_idle_tracking() {
        let channel = TripChannel::new(SeatLedger::new(5, 2, []), 4);
        assert!(channel.is_idle());

        let sub = channel.subscribe().await;
        assert!(!channel.is_idle());
        drop(sub);
        assert!(channel.is_idle());

        let _guard = channel.enter().await;
        assert!(!channel.is_idle());
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_past_capacity() {
        let channel = TripChannel::new(SeatLedger::new(5, 10, []), 2);
        let mut sub = channel.subscribe().await;

        for seat_number in 1..=5 {
            channel.enter().await.publish(|seq| TripEvent::SeatUnlocked {
                trip_id: 5,
                seq,
                seat_number,
                user_id: None,
            });
        }

        assert!(matches!(sub.receiver.recv().await, Err(broadcast::error::RecvError::Lagged(3))));
        assert_eq!(sub.receiver.recv().await.unwrap().seq(), 4);
    }
}
