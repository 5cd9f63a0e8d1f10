use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::{error, warn};
use trailway_core::repository::BookingRepository;
use trailway_core::{Booking, CoreError, PassengerDetails, SeatNumber, TripId};

use crate::{error::AppError, middleware::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct BookingCreate {
    pub trip_id: TripId,
    pub seat_numbers: Vec<SeatNumber>,
    pub gender: String,
    pub age: i32,
    pub phone_number: String,
}

/// POST /v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BookingCreate>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let passenger = PassengerDetails {
        gender: req.gender,
        age: req.age,
        phone_number: req.phone_number,
    };
    let booking = state
        .finalizer
        .finalize(req.trip_id, &user.user_id, &req.seat_numbers, passenger)
        .await?;

    if let Some(kafka) = state.kafka.clone() {
        let published = booking.clone();
        tokio::spawn(async move {
            if let Err(e) = kafka.publish_booking_confirmed(&published).await {
                warn!("booking.confirmed for {} not published: {}", published.booking_number, e);
            }
        });
    }

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings/mine
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.registry.bookings().list_bookings(&user.user_id).await.map_err(|e| {
        error!("Listing bookings of {} failed: {}", user.user_id, e);
        CoreError::Persistence(e.to_string())
    })?;
    Ok(Json(bookings))
}

/// GET /v1/bookings/{booking_number}
///
/// Bookings of other users are reported as missing.
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_number): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .registry
        .bookings()
        .get_booking(&booking_number)
        .await
        .map_err(|e| {
            error!("Loading booking {} failed: {}", booking_number, e);
            CoreError::Persistence(e.to_string())
        })?
        .filter(|b| b.owner_user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", booking_number)))?;

    Ok(Json(booking))
}
