pub mod booking;
pub mod clock;
pub mod events;
pub mod identity;
pub mod memory;
pub mod repository;
pub mod seat;

pub use booking::{Booking, BookingStatus, PassengerDetails};
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{LockedSeat, TripEvent};
pub use seat::{SeatLock, SeatState, SeatStatus};

/// Scheduled trip identifier, as issued by the catalog.
pub type TripId = i64;
/// Seat number within a trip, `1..=total_seats`.
pub type SeatNumber = i32;
/// Stable user id handed out by the identity provider (JWT `sub`).
pub type UserId = String;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Identity verification failed: {0}")]
    Identity(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
