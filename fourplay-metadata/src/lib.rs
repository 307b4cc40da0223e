//! fourplay-metadata library interface
//!
//! Exposes the aggregation engine and router for integration testing.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod providers;
pub mod scoring;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use fourplay_common::config::{Credentials, TomlConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::aggregator::Aggregator;
use crate::cache::{InMemoryCache, MetadataCache};
use crate::fetcher::{FetchError, HttpFetcher, JsonFetcher, RetryPolicy};
use crate::providers::ProviderContext;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    /// Response cache shared by all provider adapters
    pub cache: Arc<dyn MetadataCache>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last unexpected failure for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, cache: Arc<dyn MetadataCache>) -> Self {
        Self {
            aggregator,
            cache,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Wire cache, adapters and aggregator around the given fetcher
    pub fn assemble(
        fetcher: Arc<dyn JsonFetcher>,
        config: &TomlConfig,
        credentials: &Credentials,
    ) -> Self {
        let cache: Arc<dyn MetadataCache> =
            Arc::new(InMemoryCache::new(Duration::from_secs(config.cache.ttl_secs)));
        let ctx = ProviderContext::new(fetcher, cache.clone(), config.user_agent.clone());
        let aggregator = Arc::new(Aggregator::new(ctx, &config.providers, credentials));
        Self::new(aggregator, cache)
    }

    /// Production wiring with the reqwest-backed fetcher
    pub fn from_config(config: &TomlConfig, credentials: &Credentials) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(RetryPolicy::from_config(&config.fetch))?;
        Ok(Self::assemble(Arc::new(fetcher), config, credentials))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/fourplay/metadata", post(api::fetch_metadata))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
