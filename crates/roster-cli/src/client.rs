//! HTTP client for the roster API.
//!
//! Implements [`AuthService`] and [`SearchService`] over `reqwest`. Transport
//! failures (refused connections, timeouts) are retried with a short
//! exponential backoff; a response with any status is never retried.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use roster_core::{AuthService, Error, Identity, LoginError, SearchQuery, SearchService};
use serde::Serialize;
use tracing::{debug, warn};

use crate::Config;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 50;
const BACKOFF_CAP_MS: u64 = 400;

/// API client for the login and search endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
}

impl ApiClient {
    /// Creates a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, build: impl Fn() -> RequestBuilder) -> reqwest::Result<Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) && attempt < MAX_ATTEMPTS => {
                    let backoff = backoff_for(attempt);
                    warn!(
                        attempt,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

fn backoff_for(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let backoff_ms = BACKOFF_BASE_MS
        .saturating_mul(2_u64.saturating_pow(exponent))
        .min(BACKOFF_CAP_MS);
    Duration::from_millis(backoff_ms)
}

#[async_trait]
impl AuthService for ApiClient {
    async fn login(&self, name: &str) -> std::result::Result<Identity, LoginError> {
        let url = format!("{}/login", self.base_url);
        let request = LoginRequest { name };

        let response = self
            .send(|| self.client.post(&url).json(&request))
            .await
            .map_err(|e| LoginError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), %body, "login rejected");
            return Err(LoginError::Rejected {
                status: status.as_u16(),
            });
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| LoginError::InvalidResponse {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl SearchService for ApiClient {
    async fn search(&self, query: &SearchQuery) -> roster_core::Result<serde_json::Value> {
        let url = format!("{}/search", self.base_url);
        let pairs = query.query_pairs();

        let response = self
            .send(|| self.client.get(&url).query(&pairs))
            .await
            .map_err(|e| Error::remote(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote_status(
                status.as_u16(),
                format!("search failed: {body}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::remote(format!("failed to read search response: {e}")))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        assert_eq!(backoff_for(1), Duration::from_millis(50));
        assert_eq!(backoff_for(2), Duration::from_millis(100));
        assert_eq!(backoff_for(3), Duration::from_millis(200));
        assert_eq!(backoff_for(4), Duration::from_millis(400));
        assert_eq!(backoff_for(10), Duration::from_millis(400));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = Config {
            api_url: "http://localhost:8000/".to_string(),
            state_dir: std::path::PathBuf::from("/tmp"),
            timeout: Duration::from_secs(1),
            format: crate::OutputFormat::Text,
        };
        let client = ApiClient::new(&config).expect("client");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
