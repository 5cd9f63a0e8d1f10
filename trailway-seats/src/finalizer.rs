use std::sync::Arc;

use tracing::{error, info, warn};
use trailway_core::booking::{generate_booking_number, validate_seat_selection};
use trailway_core::{
    Booking, Clock, CoreError, CoreResult, PassengerDetails, SeatNumber, SeatState, SeatStatus, TripEvent, TripId,
};

use crate::registry::SeatRegistry;

/// Promotes a user's held seats into a confirmed booking, all or nothing.
pub struct BookingFinalizer {
    registry: Arc<SeatRegistry>,
}

impl BookingFinalizer {
    pub fn new(registry: Arc<SeatRegistry>) -> Self {
        Self { registry }
    }

    /// Validation happens before the ledger is touched. Ownership checks, the
    /// persistence write and the `Locked -> Booked` transitions all happen in
    /// one pass through the trip's critical section. Any failure leaves every
    /// seat as it was.
    pub async fn finalize(
        &self,
        trip_id: TripId,
        user_id: &str,
        seat_numbers: &[SeatNumber],
        passenger_details: PassengerDetails,
    ) -> CoreResult<Booking> {
        let settings = self.registry.settings();
        let seats = validate_seat_selection(seat_numbers, settings.max_seats_per_booking)?;
        passenger_details.validate()?;

        let channel = self.registry.channel(trip_id).await?;
        let mut trip = channel.enter().await;
        let now = self.registry.clock().now();

        for seat in &seats {
            let reason = match trip.ledger().get_status(*seat)? {
                SeatStatus::Locked { owner, expires_at } if owner == user_id => {
                    if *expires_at > now {
                        continue;
                    }
                    format!("hold on seat {} expired", seat)
                }
                SeatStatus::Locked { .. } => format!("seat {} held by another user", seat),
                SeatStatus::Booked => format!("seat {} already booked", seat),
                SeatStatus::Free => format!("seat {} is not held by you", seat),
            };
            warn!("Finalize for {} on trip {} rejected: {}", user_id, trip_id, reason);
            return Err(CoreError::Conflict(reason));
        }

        let booking = Booking::confirmed(
            generate_booking_number(&settings.booking_prefix),
            trip_id,
            user_id.to_string(),
            seats,
            passenger_details,
            now,
        );

        self.registry.bookings().save_booking(&booking).await.map_err(|e| {
            error!("Failed to persist booking {}: {}", booking.booking_number, e);
            CoreError::Persistence(e.to_string())
        })?;

        for seat in &booking.seat_numbers {
            trip.ledger_mut().compare_and_set(*seat, SeatState::Locked, SeatStatus::Booked)?;
        }
        trip.publish(|seq| TripEvent::SeatBooked {
            trip_id,
            seq,
            seat_numbers: booking.seat_numbers.clone(),
            booking_number: booking.booking_number.clone(),
        });

        info!(
            "Booking {} confirmed for {} on trip {}: seats {:?}",
            booking.booking_number, user_id, trip_id, booking.seat_numbers
        );
        Ok(booking)
    }
}
