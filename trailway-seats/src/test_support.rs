use std::sync::Arc;

use trailway_core::memory::{InMemoryBookingRepository, StaticTripCatalog};
use trailway_core::repository::TripSummary;
use trailway_core::{ManualClock, PassengerDetails};

use crate::{BookingFinalizer, LockManager, SeatRegistry, SeatSettings};

/// Trip 1 has 40 seats, trip 2 has 20.
pub(crate) struct Harness {
    pub clock: Arc<ManualClock>,
    pub bookings: Arc<InMemoryBookingRepository>,
    pub registry: Arc<SeatRegistry>,
    pub locks: Arc<LockManager>,
    pub finalizer: Arc<BookingFinalizer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(SeatSettings::default())
    }

    pub fn with_settings(settings: SeatSettings) -> Self {
        let clock = Arc::new(ManualClock::default());
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let catalog = StaticTripCatalog::new([trip(1, 40), trip(2, 20)]);
        let registry = Arc::new(SeatRegistry::new(
            Arc::new(catalog),
            bookings.clone(),
            clock.clone(),
            settings,
        ));

        Self {
            clock,
            bookings,
            locks: Arc::new(LockManager::new(registry.clone())),
            finalizer: Arc::new(BookingFinalizer::new(registry.clone())),
            registry,
        }
    }

    pub fn passenger() -> PassengerDetails {
        PassengerDetails {
            gender: "F".to_string(),
            age: 29,
            phone_number: "9876543210".to_string(),
        }
    }
}

fn trip(trip_id: i64, total_seats: i32) -> TripSummary {
    TripSummary {
        trip_id,
        source: "Mumbai".to_string(),
        destination: "Pune".to_string(),
        departure_time: chrono::Utc::now() + chrono::Duration::days(1),
        price: 650,
        total_seats,
    }
}
