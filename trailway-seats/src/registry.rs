use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};
use trailway_core::repository::{BookingRepository, TripCatalog};
use trailway_core::{Clock, CoreError, CoreResult, SeatNumber, TripId};

use crate::channel::{Subscription, TripChannel};
use crate::ledger::SeatLedger;
use crate::settings::SeatSettings;

/// Current seat availability of a trip, served before the live channel attaches.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeatSnapshot {
    pub trip_id: TripId,
    pub total_seats: i32,
    pub booked_seats: Vec<SeatNumber>,
    pub locked_count: usize,
    pub available_seats: usize,
}

/// Owns the trip channels, creating them on first use and dropping them
/// once idle.
pub struct SeatRegistry {
    catalog: Arc<dyn TripCatalog>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
    settings: SeatSettings,
    trips: RwLock<HashMap<TripId, Arc<TripChannel>>>,
}

impl SeatRegistry {
    pub fn new(
        catalog: Arc<dyn TripCatalog>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
        settings: SeatSettings,
    ) -> Self {
        Self {
            catalog,
            bookings,
            clock,
            settings,
            trips: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &SeatSettings {
        &self.settings
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn bookings(&self) -> &dyn BookingRepository {
        self.bookings.as_ref()
    }

    /// The channel of `trip_id`, loading the trip from the catalog and its
    /// booked seats from persistence on first use.
    ///
    /// Loading happens under the map's write lock, so no channel of the same
    /// trip can be booked against and evicted while the seed is read.
    pub async fn channel(&self, trip_id: TripId) -> CoreResult<Arc<TripChannel>> {
        if let Some(channel) = self.trips.read().await.get(&trip_id) {
            return Ok(channel.clone());
        }

        let mut trips = self.trips.write().await;
        if let Some(channel) = trips.get(&trip_id) {
            return Ok(channel.clone());
        }

        let trip = self
            .catalog
            .get_trip(trip_id)
            .await
            .map_err(|e| {
                error!("Catalog lookup for trip {} failed: {}", trip_id, e);
                CoreError::Internal(e.to_string())
            })?
            .ok_or_else(|| CoreError::NotFound(format!("trip {} not found", trip_id)))?;

        let booked = self.bookings.booked_seats(trip_id).await.map_err(|e| {
            error!("Loading booked seats for trip {} failed: {}", trip_id, e);
            CoreError::Persistence(e.to_string())
        })?;

        info!("Opening seat channel for trip {} ({} seats, {} booked)", trip_id, trip.total_seats, booked.len());
        let channel = Arc::new(TripChannel::new(
            SeatLedger::new(trip_id, trip.total_seats, booked),
            self.settings.channel_capacity,
        ));
        trips.insert(trip_id, channel.clone());

        Ok(channel)
    }

    pub async fn subscribe(&self, trip_id: TripId) -> CoreResult<Subscription> {
        let channel = self.channel(trip_id).await?;
        Ok(channel.subscribe().await)
    }

    pub async fn snapshot(&self, trip_id: TripId) -> CoreResult<SeatSnapshot> {
        let channel = self.channel(trip_id).await?;
        let trip = channel.enter().await;
        let ledger = trip.ledger();

        Ok(SeatSnapshot {
            trip_id,
            total_seats: channel.total_seats(),
            booked_seats: ledger.booked_seats(),
            locked_count: ledger.locks().count(),
            available_seats: ledger.free_count(),
        })
    }

    /// Every open channel, for the expiry sweep.
    pub async fn channels(&self) -> Vec<Arc<TripChannel>> {
        self.trips.read().await.values().cloned().collect()
    }

    pub async fn open_trips(&self) -> usize {
        self.trips.read().await.len()
    }

    /// Drop channels with no subscribers, no locks and no outstanding handle.
    ///
    /// The map's write lock is held, so no new handle can be handed out while
    /// a channel is judged idle.
    pub async fn evict_idle(&self) -> usize {
        let mut trips = self.trips.write().await;
        let before = trips.len();
        trips.retain(|_, channel| Arc::strong_count(channel) > 1 || !channel.is_idle());

        let evicted = before - trips.len();
        if evicted > 0 {
            info!("Evicted {} idle seat channels", evicted);
        }
        evicted
    }
}
