//! Session-token provider
//!
//! Every remote request carries a bearer credential obtained from an
//! external session provider. The provider is a trait so the composing
//! application can plug in its own session store; tokens are wrapped in
//! `Zeroizing` so they are wiped from memory when dropped.

use async_trait::async_trait;
use zeroize::Zeroizing;

/// Source of the bearer credential for remote API calls.
///
/// Returning `None` means no session is active; the engine treats that as
/// a fatal, non-retried error for the whole sync invocation.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current access token, or None when not authenticated.
    async fn access_token(&self) -> Option<Zeroizing<String>>;
}

/// Provider that reads the token from an environment variable on each call.
pub struct EnvSessionProvider {
    var_name: String,
}

impl EnvSessionProvider {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }
}

impl Default for EnvSessionProvider {
    fn default() -> Self {
        Self::new("SYNC_API_TOKEN")
    }
}

#[async_trait]
impl SessionProvider for EnvSessionProvider {
    async fn access_token(&self) -> Option<Zeroizing<String>> {
        match std::env::var(&self.var_name) {
            Ok(token) if !token.trim().is_empty() => Some(Zeroizing::new(token)),
            _ => None,
        }
    }
}

/// Fixed-token provider, mainly for tests and tooling.
pub struct StaticSessionProvider {
    token: Option<Zeroizing<String>>,
}

impl StaticSessionProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(Zeroizing::new(token.into())),
        }
    }

    /// Provider with no active session.
    pub fn unauthenticated() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn access_token(&self) -> Option<Zeroizing<String>> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticSessionProvider::new("secret-token");
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.as_str(), "secret-token");
    }

    #[tokio::test]
    async fn test_unauthenticated_provider_returns_none() {
        let provider = StaticSessionProvider::unauthenticated();
        assert!(provider.access_token().await.is_none());
    }
}
