use axum::{
    extract::State,
    http::Method,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod seats;
pub mod state;
pub mod stream;
pub mod worker;

pub use state::AppState;

use crate::middleware::{customer_auth_middleware, rate_limit_middleware};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let protected = Router::new()
        .route("/v1/trips/{trip_id}/seats/{seat_number}/lock", post(seats::lock_seat))
        .route("/v1/trips/{trip_id}/seats/{seat_number}/unlock", post(seats::unlock_seat))
        .route("/v1/trips/{trip_id}/locks/release", post(seats::release_all))
        .route("/v1/trips/{trip_id}/stream", get(stream::stream_trip))
        .route("/v1/bookings", post(bookings::create_booking))
        .route("/v1/bookings/mine", get(bookings::my_bookings))
        .route("/v1/bookings/{booking_number}", get(bookings::get_booking))
        .route_layer(from_fn_with_state(state.clone(), customer_auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/v1/trips/{trip_id}/seats", get(seats::seat_snapshot))
        .nest("/auth", auth::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

/// Reports each configured backend as `ok` or `unavailable`, and `disabled`
/// when it is not configured. The core keeps serving without them.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                warn!("Database health check failed: {}", e);
                "unavailable"
            }
        },
        None => "disabled",
    };
    let redis = match &state.redis {
        Some(redis) => match redis.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                warn!("Redis health check failed: {}", e);
                "unavailable"
            }
        },
        None => "disabled",
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "redis": redis,
        "open_trips": state.registry.open_trips().await,
    }))
}
