use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use trailway_core::{SeatNumber, TripEvent, TripId, UserId};

/// How one seat looks from this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatView {
    Free,
    Mine,
    LockedByOther,
    Booked,
}

/// Local mirror of one trip's seat map for one user.
///
/// Each seat remembers the sequence number of the last server message that
/// set it, so duplicate or out-of-order deliveries are ignored and applying
/// a batch of events in any order ends in the same view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientView {
    trip_id: TripId,
    user_id: UserId,
    booked_seats: BTreeSet<SeatNumber>,
    locked_by_others: BTreeSet<SeatNumber>,
    my_selected_seats: BTreeSet<SeatNumber>,
    seat_seq: HashMap<SeatNumber, u64>,
    snapshot_seq: u64,
}

impl ClientView {
    pub fn new(trip_id: TripId, user_id: impl Into<UserId>) -> Self {
        Self {
            trip_id,
            user_id: user_id.into(),
            booked_seats: BTreeSet::new(),
            locked_by_others: BTreeSet::new(),
            my_selected_seats: BTreeSet::new(),
            seat_seq: HashMap::new(),
            snapshot_seq: 0,
        }
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn booked_seats(&self) -> &BTreeSet<SeatNumber> {
        &self.booked_seats
    }

    pub fn locked_by_others(&self) -> &BTreeSet<SeatNumber> {
        &self.locked_by_others
    }

    pub fn my_selected_seats(&self) -> &BTreeSet<SeatNumber> {
        &self.my_selected_seats
    }

    pub fn seat(&self, seat_number: SeatNumber) -> SeatView {
        if self.booked_seats.contains(&seat_number) {
            SeatView::Booked
        } else if self.my_selected_seats.contains(&seat_number) {
            SeatView::Mine
        } else if self.locked_by_others.contains(&seat_number) {
            SeatView::LockedByOther
        } else {
            SeatView::Free
        }
    }

    /// Apply one server message. Returns false when it was ignored as
    /// stale, duplicated, or addressed to another trip.
    ///
    /// `InitialState` always replaces the whole view.
    pub fn apply(&mut self, event: &TripEvent) -> bool {
        if event.trip_id() != self.trip_id {
            return false;
        }

        match event {
            TripEvent::InitialState {
                seq,
                locked_seats,
                booked_seats,
                ..
            } => {
                self.booked_seats = booked_seats.iter().copied().collect();
                self.locked_by_others.clear();
                self.my_selected_seats.clear();
                self.seat_seq.clear();
                self.snapshot_seq = *seq;

                for lock in locked_seats {
                    if lock.user_id == self.user_id {
                        self.my_selected_seats.insert(lock.seat_number);
                    } else {
                        self.locked_by_others.insert(lock.seat_number);
                    }
                }
                true
            }
            TripEvent::SeatLocked {
                seq,
                seat_number,
                user_id,
                ..
            } => {
                let view = if *user_id == self.user_id {
                    SeatView::Mine
                } else {
                    SeatView::LockedByOther
                };
                self.set_seat(*seat_number, *seq, view)
            }
            TripEvent::SeatUnlocked { seq, seat_number, .. } => self.set_seat(*seat_number, *seq, SeatView::Free),
            TripEvent::SeatBooked { seq, seat_numbers, .. } => {
                if *seq <= self.snapshot_seq {
                    return false;
                }
                let mut changed = false;
                for seat in seat_numbers {
                    changed |= self.booked_seats.insert(*seat);
                    self.locked_by_others.remove(seat);
                    self.my_selected_seats.remove(seat);
                    let last = self.seat_seq.entry(*seat).or_insert(0);
                    *last = (*last).max(*seq);
                }
                changed
            }
        }
    }

    /// Record a lock this user was just granted, before its event arrives.
    pub fn select(&mut self, seat_number: SeatNumber, seq: u64) -> bool {
        self.set_seat(seat_number, seq, SeatView::Mine)
    }

    /// Record a release this user just made. `seq` is absent when the server
    /// reported the seat as already free.
    pub fn deselect(&mut self, seat_number: SeatNumber, seq: Option<u64>) -> bool {
        match seq {
            Some(seq) => self.set_seat(seat_number, seq, SeatView::Free),
            None => self.my_selected_seats.remove(&seat_number),
        }
    }

    /// Drop the whole local selection, returning the seats that were in it.
    pub fn clear_selection(&mut self) -> Vec<SeatNumber> {
        std::mem::take(&mut self.my_selected_seats).into_iter().collect()
    }

    fn set_seat(&mut self, seat_number: SeatNumber, seq: u64, view: SeatView) -> bool {
        if self.booked_seats.contains(&seat_number) || seq <= self.snapshot_seq {
            return false;
        }
        if self.seat_seq.get(&seat_number).is_some_and(|last| *last >= seq) {
            return false;
        }
        self.seat_seq.insert(seat_number, seq);

        self.locked_by_others.remove(&seat_number);
        self.my_selected_seats.remove(&seat_number);
        match view {
            SeatView::Mine => {
                self.my_selected_seats.insert(seat_number);
            }
            SeatView::LockedByOther => {
                self.locked_by_others.insert(seat_number);
            }
            SeatView::Free => {}
            SeatView::Booked => {
                self.booked_seats.insert(seat_number);
            }
        }
        true
    }
}

/// Functional form of [`ClientView::apply`].
pub fn reconcile(mut view: ClientView, event: &TripEvent) -> ClientView {
    view.apply(event);
    view
}
