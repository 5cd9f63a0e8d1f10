use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use trailway_core::{SeatNumber, TripId};
use trailway_seats::{LockGrant, SeatSnapshot, UnlockOutcome};

use crate::{error::AppError, middleware::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub seat_number: SeatNumber,
    pub released: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: Vec<SeatNumber>,
}

/// GET /v1/trips/{trip_id}/seats
pub async fn seat_snapshot(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
) -> Result<Json<SeatSnapshot>, AppError> {
    Ok(Json(state.registry.snapshot(trip_id).await?))
}

/// POST /v1/trips/{trip_id}/seats/{seat_number}/lock
pub async fn lock_seat(
    State(state): State<AppState>,
    Path((trip_id, seat_number)): Path<(TripId, SeatNumber)>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LockGrant>, AppError> {
    let grant = state.locks.lock(trip_id, seat_number, &user.user_id).await?;
    Ok(Json(grant))
}

/// POST /v1/trips/{trip_id}/seats/{seat_number}/unlock
pub async fn unlock_seat(
    State(state): State<AppState>,
    Path((trip_id, seat_number)): Path<(TripId, SeatNumber)>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UnlockResponse>, AppError> {
    let response = match state.locks.unlock(trip_id, seat_number, &user.user_id).await? {
        UnlockOutcome::Released { seq } => UnlockResponse {
            seat_number,
            released: true,
            message: "Seat released",
            seq: Some(seq),
        },
        UnlockOutcome::AlreadyFree => UnlockResponse {
            seat_number,
            released: false,
            message: "No action taken",
            seq: None,
        },
    };
    Ok(Json(response))
}

/// POST /v1/trips/{trip_id}/locks/release
pub async fn release_all(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let released = state.locks.release_all(trip_id, &user.user_id).await?;
    Ok(Json(ReleaseResponse { released }))
}
