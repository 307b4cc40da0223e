//! Resilient HTTP-JSON fetcher
//!
//! Wraps transport errors, non-200 statuses and undecodable bodies into a
//! uniform "no data" outcome after a bounded number of attempts. Downstream
//! adapters cannot (and need not) distinguish a hard failure from an empty
//! provider answer.

use async_trait::async_trait;
use fourplay_common::config::{BackoffKind, FetchConfig};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Header name/value pairs attached to a single provider request
pub type Headers = [(&'static str, String)];

/// Failure of a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Body is not JSON: {0}")]
    Decode(String),

    #[error("Client build failed: {0}")]
    Client(String),
}

/// Delay growth between attempts
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    Fixed,
    Exponential { factor: f64, max_delay: Duration },
}

/// Retry policy consumed by [`HttpFetcher`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(6),
            retry_delay: Duration::from_millis(500),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        let backoff = match config.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                factor: config.backoff_factor,
                max_delay: Duration::from_millis(config.max_delay_ms),
            },
        };

        Self {
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            backoff,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.retry_delay,
            Backoff::Exponential { factor, max_delay } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let scaled = self.retry_delay.as_secs_f64() * factor.powi(exponent);
                Duration::from_secs_f64(scaled.min(max_delay.as_secs_f64()))
            }
        }
    }
}

/// Fetch capability injected into the provider adapters
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// GET `url` and decode the body as JSON; `None` once all attempts fail
    async fn fetch_json(&self, url: &Url, headers: &Headers) -> Option<Value>;
}

/// reqwest-backed fetcher applying a [`RetryPolicy`]
pub struct HttpFetcher {
    http_client: Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            policy,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt(&self, url: &Url, headers: &Headers) -> Result<Value, FetchError> {
        let mut request = self
            .http_client
            .get(url.clone())
            .timeout(self.policy.attempt_timeout);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        // Error payloads on non-200 responses are not inspected
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &Url, headers: &Headers) -> Option<Value> {
        let start_time = Instant::now();
        let host = url.host_str().unwrap_or("unknown");

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(url, headers).await {
                Ok(body) => {
                    if attempt > 1 {
                        tracing::debug!(
                            host,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis(),
                            "Provider request succeeded after retry"
                        );
                    }
                    return Some(body);
                }
                Err(err) => {
                    tracing::warn!(
                        host,
                        path = url.path(),
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "Provider request attempt failed"
                    );

                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    }
                }
            }
        }

        tracing::error!(
            host,
            path = url.path(),
            attempts = self.policy.max_attempts,
            elapsed_ms = start_time.elapsed().as_millis(),
            "Provider request failed: attempts exhausted"
        );
        None
    }
}
