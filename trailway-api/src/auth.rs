use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::CustomerClaims, state::AppState};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user_id: String,
    expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/guest", post(login_guest))
}

pub fn issue_token(
    secret: &str,
    sub: &str,
    role: &str,
    email: Option<String>,
    expiration_seconds: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = CustomerClaims {
        sub: sub.to_string(),
        email,
        role: role.to_string(),
        exp: (Utc::now() + Duration::seconds(expiration_seconds as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let user_id = format!("guest-{}", Uuid::new_v4());
    let token = issue_token(&state.auth.secret, &user_id, "GUEST", None, state.auth.expiration)
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;

    info!("Issued guest identity {}", user_id);
    Ok(Json(AuthResponse {
        token,
        user_id,
        expires_in: state.auth.expiration,
    }))
}
