use async_trait::async_trait;
use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use trailway_core::identity::IdentityResolver;
use trailway_core::{CoreError, CoreResult, UserId};

use crate::error::AppError;
use crate::state::AppState;

pub const ACCEPTED_ROLES: [&str; 2] = ["CUSTOMER", "GUEST"];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

/// The caller, as resolved by [`customer_auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// Resolves HS256 tokens signed with the configured secret.
pub struct JwtIdentity {
    key: DecodingKey,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentity {
    async fn resolve(&self, token: &str) -> CoreResult<UserId> {
        let token_data = decode::<CustomerClaims>(token, &self.key, &Validation::default())
            .map_err(|e| CoreError::Identity(e.to_string()))?;

        if !ACCEPTED_ROLES.contains(&token_data.claims.role.as_str()) {
            return Err(CoreError::Forbidden(format!("role {} cannot book seats", token_data.claims.role)));
        }

        Ok(token_data.claims.sub)
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Bearer header first; `?access_token=` for clients such as `EventSource`
/// that cannot set headers.
fn request_token(req: &Request) -> Option<String> {
    if let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(query)| query.access_token)
}

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request_token(&req).ok_or_else(|| AppError::Authentication("missing bearer token".to_string()))?;
    let user_id = state.identity.resolve(&token).await?;

    req.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(req).await)
}
