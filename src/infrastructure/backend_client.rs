//! HTTP client for the authoritative trade backend.
//!
//! Implements `RemoteTradeApi` over reqwest. Every request carries a
//! bearer credential from the session provider; a missing credential
//! fails the call before any network traffic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

use crate::auth::SessionProvider;
use crate::config::SyncConfig;
use crate::domain::repositories::remote_api::{
    ApiEnvelope, ApiError, ApiResult, NewRemoteTrade, RemoteTrade, RemoteTradeApi,
    RemoteTradeDelta,
};

/// Backend connection configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_base: String,
    pub request_timeout: Duration,
}

impl BackendConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_sync_config(config: &SyncConfig) -> Self {
        Self {
            api_base: config.api_base_url.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        }
    }
}

/// Trade backend client
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
    session: Arc<dyn SessionProvider>,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(
        config: BackendConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("tradesync/0.1.0")
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    async fn bearer(&self) -> ApiResult<Zeroizing<String>> {
        self.session
            .access_token()
            .await
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, message })
    }
}

#[async_trait]
impl RemoteTradeApi for BackendClient {
    async fn create_trade(&self, trade: &NewRemoteTrade) -> ApiResult<RemoteTrade> {
        let token = self.bearer().await?;
        let url = format!("{}/trades", self.config.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(trade)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to create trade: {}", e)))?;

        let response = Self::check_status(response).await?;
        let envelope: ApiEnvelope<RemoteTrade> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        debug!("Created remote trade {}", envelope.data.id);
        Ok(envelope.data)
    }

    async fn update_trade(&self, remote_id: &str, delta: &RemoteTradeDelta) -> ApiResult<()> {
        let token = self.bearer().await?;
        let url = format!("{}/trades/{}", self.config.api_base, remote_id);

        let response = self
            .client
            .put(&url)
            .bearer_auth(token.as_str())
            .json(delta)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to update trade: {}", e)))?;

        Self::check_status(response).await?;
        debug!("Updated remote trade {}", remote_id);
        Ok(())
    }

    async fn list_trades(
        &self,
        updated_after: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<RemoteTrade>> {
        let token = self.bearer().await?;
        let url = format!("{}/trades", self.config.api_base);

        let mut request = self.client.get(&url).bearer_auth(token.as_str());
        if let Some(cursor) = updated_after {
            request = request.query(&[("updated_after", cursor.to_rfc3339())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to list trades: {}", e)))?;

        let response = Self::check_status(response).await?;
        let envelope: ApiEnvelope<Vec<RemoteTrade>> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticSessionProvider;

    #[tokio::test]
    async fn test_missing_token_fails_before_any_network_call() {
        // Unroutable base URL: if the credential check did not short-circuit,
        // this would be a network error instead.
        let client = BackendClient::new(
            BackendConfig::new("http://127.0.0.1:1"),
            Arc::new(StaticSessionProvider::unauthenticated()),
        )
        .unwrap();

        let err = client.list_trades(None).await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }
}
