pub mod auth;
pub mod rate_limit;

pub use auth::{customer_auth_middleware, AuthUser, CustomerClaims, JwtIdentity};
pub use rate_limit::rate_limit_middleware;
