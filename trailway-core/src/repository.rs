use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Booking, SeatNumber, TripId, UserId};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Trip metadata the seat core needs from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripSummary {
    pub trip_id: TripId,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub price: i64,
    pub total_seats: i32,
}

/// Read access to scheduled trips
#[async_trait]
pub trait TripCatalog: Send + Sync {
    async fn get_trip(&self, trip_id: TripId) -> Result<Option<TripSummary>, RepoError>;
}

/// Durable store for finalized bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Must only return `Ok` once the booking is durable.
    async fn save_booking(&self, booking: &Booking) -> Result<(), RepoError>;

    async fn booked_seats(&self, trip_id: TripId) -> Result<Vec<SeatNumber>, RepoError>;

    async fn get_booking(&self, booking_number: &str) -> Result<Option<Booking>, RepoError>;

    async fn list_bookings(&self, user_id: &UserId) -> Result<Vec<Booking>, RepoError>;
}
