//! In-process collaborators, used when no database is configured and in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::RwLock;

use crate::repository::{BookingRepository, RepoError, TripCatalog, TripSummary};
use crate::{Booking, SeatNumber, TripId, UserId};

pub struct StaticTripCatalog {
    trips: HashMap<TripId, TripSummary>,
}

impl StaticTripCatalog {
    pub fn new(trips: impl IntoIterator<Item = TripSummary>) -> Self {
        Self {
            trips: trips.into_iter().map(|t| (t.trip_id, t)).collect(),
        }
    }

    /// A single trip with `total_seats` seats, for tests.
    pub fn single(trip_id: TripId, total_seats: i32) -> Self {
        Self::new([TripSummary {
            trip_id,
            source: "Mumbai".to_string(),
            destination: "Pune".to_string(),
            departure_time: Utc::now() + Duration::days(1),
            price: 650,
            total_seats,
        }])
    }

    /// Sample schedule served by a development instance without a database.
    pub fn demo() -> Self {
        let day = Utc.with_ymd_and_hms(2026, 12, 1, 6, 30, 0).single().unwrap_or_else(Utc::now);
        let routes = [
            ("Mumbai", "Pune", 650, 40),
            ("Pune", "Goa", 1200, 36),
            ("Bengaluru", "Chennai", 900, 40),
        ];

        Self::new(routes.iter().enumerate().map(|(i, (source, destination, price, seats))| TripSummary {
            trip_id: i as TripId + 1,
            source: source.to_string(),
            destination: destination.to_string(),
            departure_time: day + Duration::hours(i as i64 * 3),
            price: *price,
            total_seats: *seats,
        }))
    }
}

#[async_trait]
impl TripCatalog for StaticTripCatalog {
    async fn get_trip(&self, trip_id: TripId) -> Result<Option<TripSummary>, RepoError> {
        Ok(self.trips.get(&trip_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<Vec<Booking>>,
    fail_writes: AtomicBool,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `save_booking` fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn count(&self) -> usize {
        self.bookings.read().await.len()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn save_booking(&self, booking: &Booking) -> Result<(), RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("booking store unavailable".into());
        }

        let mut bookings = self.bookings.write().await;
        if bookings.iter().any(|b| b.booking_number == booking.booking_number) {
            return Err(format!("duplicate booking number {}", booking.booking_number).into());
        }
        let taken = bookings
            .iter()
            .filter(|b| b.trip_id == booking.trip_id)
            .flat_map(|b| b.seat_numbers.iter())
            .find(|n| booking.seat_numbers.contains(*n));
        if let Some(seat) = taken {
            return Err(format!("seat {} already booked on trip {}", seat, booking.trip_id).into());
        }

        bookings.push(booking.clone());
        Ok(())
    }

    async fn booked_seats(&self, trip_id: TripId) -> Result<Vec<SeatNumber>, RepoError> {
        let bookings = self.bookings.read().await;
        let mut seats: Vec<SeatNumber> = bookings
            .iter()
            .filter(|b| b.trip_id == trip_id)
            .flat_map(|b| b.seat_numbers.iter().copied())
            .collect();
        seats.sort_unstable();
        Ok(seats)
    }

    async fn get_booking(&self, booking_number: &str) -> Result<Option<Booking>, RepoError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().find(|b| b.booking_number == booking_number).cloned())
    }

    async fn list_bookings(&self, user_id: &UserId) -> Result<Vec<Booking>, RepoError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().filter(|b| &b.owner_user_id == user_id).cloned().collect())
    }
}
