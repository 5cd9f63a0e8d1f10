use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use trailway_core::{SeatNumber, TripEvent, TripId, UserId};

use crate::countdown::Countdown;
use crate::view::ClientView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Connecting,
    Synced,
    Reconnecting,
}

/// Per-connection client state machine:
/// `Connecting -> Synced -> (Reconnecting -> Synced)*`.
///
/// Events are only applied once a snapshot has been received on the current
/// connection. The countdown runs while the selection is non-empty. Its
/// deadline is the first grant's `expires_at`; `hold` only applies to seats
/// restored from a snapshot, which carries no expiry.
#[derive(Debug, Clone)]
pub struct SyncAgent {
    state: SyncState,
    view: ClientView,
    countdown: Countdown,
}

impl SyncAgent {
    pub fn new(trip_id: TripId, user_id: impl Into<UserId>, hold: Duration) -> Self {
        Self {
            state: SyncState::Connecting,
            view: ClientView::new(trip_id, user_id),
            countdown: Countdown::new(hold),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn view(&self) -> &ClientView {
        &self.view
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.countdown.remaining(now)
    }

    pub fn on_message(&mut self, message: &TripEvent, now: DateTime<Utc>) -> bool {
        let applied = match message {
            TripEvent::InitialState { .. } => {
                let applied = self.view.apply(message);
                if applied {
                    self.state = SyncState::Synced;
                }
                applied
            }
            _ if self.state != SyncState::Synced => {
                debug!(event = message.name(), "dropping event received before snapshot");
                false
            }
            _ => {
                let applied = self.view.apply(message);
                if let TripEvent::SeatLocked { user_id, expires_at, .. } = message {
                    if applied && user_id == self.view.user_id() && !self.countdown.is_running() {
                        self.countdown.start_at(*expires_at);
                    }
                }
                applied
            }
        };

        self.follow_selection(now);
        applied
    }

    pub fn on_disconnect(&mut self) {
        self.state = SyncState::Reconnecting;
    }

    /// The server granted a lock requested from this client.
    pub fn on_lock_granted(
        &mut self,
        seat_number: SeatNumber,
        seq: u64,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        self.view.select(seat_number, seq);
        if self.view.my_selected_seats().contains(&seat_number) && !self.countdown.is_running() {
            self.countdown.start_at(expires_at);
        }
        self.follow_selection(now);
    }

    /// The server confirmed an unlock requested from this client.
    pub fn on_unlock_confirmed(&mut self, seat_number: SeatNumber, seq: Option<u64>, now: DateTime<Utc>) {
        self.view.deselect(seat_number, seq);
        self.follow_selection(now);
    }

    /// Advance the session timer. When it runs out the selection is cleared
    /// and the seats the client should release are returned.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Vec<SeatNumber>> {
        if !self.countdown.is_expired(now) {
            return None;
        }
        self.countdown.stop();
        Some(self.view.clear_selection())
    }

    fn follow_selection(&mut self, now: DateTime<Utc>) {
        if self.view.my_selected_seats().is_empty() {
            self.countdown.stop();
        } else if !self.countdown.is_running() {
            self.countdown.start(now);
        }
    }
}
