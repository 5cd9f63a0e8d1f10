use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;
use trailway_store::redis_repo::rate_limit_key;

use crate::state::AppState;

/// Per-address fixed window backed by Redis. Skipped when Redis is not
/// configured; fails open when Redis errors.
pub async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(redis) = state.redis.as_ref() else {
        return next.run(req).await;
    };

    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let limits = state.rate_limit;

    match redis
        .check_rate_limit(&rate_limit_key(&client), limits.requests, limits.window_seconds)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            warn!("Rate limit exceeded for {}", client);
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "Rate limit exceeded" })),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Rate limiter unavailable, allowing request: {}", e);
            next.run(req).await
        }
    }
}
