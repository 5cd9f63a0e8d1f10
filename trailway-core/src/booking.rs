use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult, SeatNumber, TripId, UserId};

/// Booking status. Only confirmed bookings are created by the core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            other => Err(CoreError::Internal(format!("Unknown booking status: {}", other))),
        }
    }
}

/// Passenger contact details collected while the seats are held.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassengerDetails {
    pub gender: String,
    pub age: i32,
    pub phone_number: String,
}

impl PassengerDetails {
    pub fn validate(&self) -> CoreResult<()> {
        if self.gender.trim().is_empty() {
            return Err(CoreError::Validation("gender is required".to_string()));
        }
        if !(1..=120).contains(&self.age) {
            return Err(CoreError::Validation(format!("age {} is out of range", self.age)));
        }

        let digits = self.phone_number.strip_prefix('+').unwrap_or(&self.phone_number);
        if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::Validation("phone number must have 7 to 15 digits".to_string()));
        }

        Ok(())
    }
}

/// A confirmed reservation of one or more seats. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub booking_number: String,
    pub trip_id: TripId,
    pub owner_user_id: UserId,
    pub seat_numbers: Vec<SeatNumber>,
    pub passenger_details: PassengerDetails,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn confirmed(
        booking_number: String,
        trip_id: TripId,
        owner_user_id: UserId,
        seat_numbers: Vec<SeatNumber>,
        passenger_details: PassengerDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            booking_number,
            trip_id,
            owner_user_id,
            seat_numbers,
            passenger_details,
            status: BookingStatus::Confirmed,
            created_at,
        }
    }
}

/// Generate a booking reference of the form `PREFIX-1A2B3C`.
pub fn generate_booking_number(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, hex[..6].to_uppercase())
}

/// Check a requested seat set and return it sorted.
///
/// Rejects empty sets, duplicates, non-positive seat numbers and sets larger
/// than `max_seats`.
pub fn validate_seat_selection(seat_numbers: &[SeatNumber], max_seats: usize) -> CoreResult<Vec<SeatNumber>> {
    if seat_numbers.is_empty() {
        return Err(CoreError::Validation("at least one seat is required".to_string()));
    }
    if seat_numbers.len() > max_seats {
        return Err(CoreError::Validation(format!(
            "at most {} seats can be booked at once, got {}",
            max_seats,
            seat_numbers.len()
        )));
    }
    if let Some(bad) = seat_numbers.iter().find(|n| **n < 1) {
        return Err(CoreError::Validation(format!("invalid seat number {}", bad)));
    }

    let unique: BTreeSet<SeatNumber> = seat_numbers.iter().copied().collect();
    if unique.len() != seat_numbers.len() {
        return Err(CoreError::Validation("duplicate seat numbers".to_string()));
    }

    Ok(unique.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger() -> PassengerDetails {
        PassengerDetails {
            gender: "F".to_string(),
            age: 34,
            phone_number: "+919876543210".to_string(),
        }
    }

    #[test]
    fn test_seat_selection_rules() {
        assert_eq!(validate_seat_selection(&[5, 3, 4], 6).unwrap(), vec![3, 4, 5]);
        assert!(matches!(validate_seat_selection(&[], 6), Err(CoreError::Validation(_))));
        assert!(matches!(validate_seat_selection(&[1, 1], 6), Err(CoreError::Validation(_))));
        assert!(matches!(validate_seat_selection(&[1, 2, 3, 4, 5, 6, 7], 6), Err(CoreError::Validation(_))));
        assert!(matches!(validate_seat_selection(&[0], 6), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_passenger_validation() {
        assert!(passenger().validate().is_ok());

        let mut p = passenger();
        p.age = 0;
        assert!(p.validate().is_err());

        let mut p = passenger();
        p.phone_number = "12-34".to_string();
        assert!(p.validate().is_err());

        let mut p = passenger();
        p.gender = "  ".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_booking_number_format() {
        let number = generate_booking_number("ABC");
        assert_eq!(number.len(), 10);
        assert!(number.starts_with("ABC-"));
        assert!(number[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(number, generate_booking_number("ABC"));
    }
}
