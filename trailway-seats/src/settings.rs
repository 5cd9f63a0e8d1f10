use std::time::Duration;

/// Tunables of the seat core.
#[derive(Debug, Clone)]
pub struct SeatSettings {
    /// Lifetime of a lock. Locks are never extended.
    pub hold_duration: chrono::Duration,
    /// Cap on seats per booking, and on seats one user may hold per trip.
    pub max_seats_per_booking: usize,
    pub sweep_interval: Duration,
    /// Per-subscriber event buffer before the subscriber is dropped as lagging.
    pub channel_capacity: usize,
    pub booking_prefix: String,
}

impl Default for SeatSettings {
    fn default() -> Self {
        Self {
            hold_duration: chrono::Duration::seconds(300),
            max_seats_per_booking: 6,
            sweep_interval: Duration::from_secs(1),
            channel_capacity: 100,
            booking_prefix: "ABC".to_string(),
        }
    }
}
