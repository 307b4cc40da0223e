//! Provider adapters
//!
//! One adapter per upstream service. Each adapter:
//! 1. builds a lower-cased cache key in its own namespace,
//! 2. returns immediately on a cache hit,
//! 3. otherwise fetches through the injected [`JsonFetcher`], interprets the
//!    provider's JSON shape, and caches the normalized record.
//!
//! Absent or mistyped fields are "no result", never an error. Every response
//! is classified into a [`ProviderResponse`] so the shape handling stays
//! explicit and testable.

pub mod discogs;
pub mod lastfm;
pub mod listenbrainz;
pub mod musicbrainz;

pub use discogs::DiscogsProvider;
pub use lastfm::LastFmProvider;
pub use listenbrainz::ListenBrainzProvider;
pub use musicbrainz::MusicBrainzProvider;

use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::cache::MetadataCache;
use crate::fetcher::JsonFetcher;

/// Capabilities shared by every adapter
#[derive(Clone)]
pub struct ProviderContext {
    pub fetcher: Arc<dyn JsonFetcher>,
    pub cache: Arc<dyn MetadataCache>,
    pub user_agent: String,
}

impl ProviderContext {
    pub fn new(
        fetcher: Arc<dyn JsonFetcher>,
        cache: Arc<dyn MetadataCache>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            user_agent: user_agent.into(),
        }
    }
}

/// Why a reachable provider's payload produced no result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("field `{0}` is absent")]
    Missing(&'static str),

    #[error("field `{0}` has an unexpected type")]
    Malformed(&'static str),

    #[error("field `{0}` is empty")]
    Empty(&'static str),
}

/// Classified provider response
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse<T> {
    /// Fetch gave up after exhausting its attempts
    Unavailable,
    /// Provider answered, but not with anything usable
    Unusable(ShapeError),
    Parsed(T),
}

impl<T> ProviderResponse<T> {
    /// Classify an optional body with a shape parser
    pub fn from_body<F>(body: Option<Value>, parse: F) -> Self
    where
        F: FnOnce(&Value) -> Result<T, ShapeError>,
    {
        match body {
            None => ProviderResponse::Unavailable,
            Some(body) => match parse(&body) {
                Ok(parsed) => ProviderResponse::Parsed(parsed),
                Err(shape) => ProviderResponse::Unusable(shape),
            },
        }
    }

    /// Collapse to "value or nothing", logging why nothing
    pub fn into_option(self, provider: &'static str, step: &'static str) -> Option<T> {
        match self {
            ProviderResponse::Parsed(parsed) => Some(parsed),
            ProviderResponse::Unavailable => {
                debug!(provider, step, "Provider unavailable, treating as empty");
                None
            }
            ProviderResponse::Unusable(shape) => {
                debug!(provider, step, reason = %shape, "Provider returned no usable data");
                None
            }
        }
    }
}

// ============================================================================
// Shape helpers
// ============================================================================

/// Required field; JSON `null` counts as absent
pub(crate) fn field<'a>(value: &'a Value, key: &'static str) -> Result<&'a Value, ShapeError> {
    match value.get(key) {
        None | Some(Value::Null) => Err(ShapeError::Missing(key)),
        Some(found) => Ok(found),
    }
}

/// Required array field
pub(crate) fn array<'a>(value: &'a Value, key: &'static str) -> Result<&'a [Value], ShapeError> {
    match field(value, key)? {
        Value::Array(items) => Ok(items),
        _ => Err(ShapeError::Malformed(key)),
    }
}

/// Required array field with at least one element
pub(crate) fn non_empty_array<'a>(
    value: &'a Value,
    key: &'static str,
) -> Result<&'a [Value], ShapeError> {
    let items = array(value, key)?;
    if items.is_empty() {
        return Err(ShapeError::Empty(key));
    }
    Ok(items)
}

/// Optional string field
pub(crate) fn opt_string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Identifier that upstreams send either as a string or a number
pub(crate) fn opt_id(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Upstream score: JSON number or numeric string, anything else reads as 0
pub(crate) fn score(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Build a provider URL from a base, extra path segments and query parameters
///
/// An empty trailing segment produces a trailing slash.
pub(crate) fn build_url(
    provider: &'static str,
    base: &str,
    segments: &[&str],
    params: &[(&str, &str)],
) -> Option<Url> {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(e) => {
            error!(provider, base, error = %e, "Invalid provider base URL");
            return None;
        }
    };

    match url.path_segments_mut() {
        Ok(mut path) => {
            path.pop_if_empty().extend(segments);
        }
        Err(()) => {
            error!(provider, base, "Provider base URL cannot carry a path");
            return None;
        }
    }

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Some(url)
}
