use async_trait::async_trait;

use crate::{CoreResult, UserId};

/// Maps the credential presented by a request or connection to a stable user id.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Fails with [`crate::CoreError::Identity`] when the credential is missing or invalid.
    async fn resolve(&self, token: &str) -> CoreResult<UserId>;
}
