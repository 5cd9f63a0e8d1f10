use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};
use trailway_core::events::BookingConfirmedEvent;
use trailway_core::Booking;

use crate::StoreError;

pub const BOOKING_CONFIRMED_TOPIC: &str = "booking.confirmed";

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    pub async fn publish_booking_confirmed(&self, booking: &Booking) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&booking_confirmed(booking))?;
        self.publish(BOOKING_CONFIRMED_TOPIC, &booking.booking_number, &payload).await?;
        Ok(())
    }
}

pub fn booking_confirmed(booking: &Booking) -> BookingConfirmedEvent {
    BookingConfirmedEvent {
        booking_number: booking.booking_number.clone(),
        trip_id: booking.trip_id,
        user_id: booking.owner_user_id.clone(),
        seat_numbers: booking.seat_numbers.clone(),
        timestamp: booking.created_at.timestamp(),
    }
}
