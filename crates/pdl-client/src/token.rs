//! Access token supply.

use async_trait::async_trait;

use crate::error::TokenError;

/// Supplies a current bearer token for the registry.
///
/// Called once per HTTP attempt; implementations own refresh and caching of
/// the underlying credential.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a bearer token valid for the next request.
    async fn access_token(&self) -> Result<String, TokenError>;
}

/// Provider that always returns the same token.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider for a fixed token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, TokenError> {
        Ok(self.token.clone())
    }
}
