//! Discogs catalog lookup
//!
//! Two sequential calls:
//! 1. `{base}/database/search?type=artist&q=<artist>&token=<token>` resolves the artist id
//! 2. `{base}/artists/<id>/releases?sort=year&per_page=50` lists releases
//!
//! Only `master` and `release` entries are kept. Without a configured token
//! the provider is skipped.

use serde_json::Value;
use tracing::debug;

use super::{array, build_url, non_empty_array, opt_id, opt_string, ProviderContext, ProviderResponse, ShapeError};
use crate::cache::{keys, CachedValue};
use crate::models::{CatalogEntry, ReleaseId};

pub const PROVIDER: &str = "discogs";

/// Page size of the release listing
pub const RELEASES_PER_PAGE: usize = 50;

const KEPT_RELEASE_TYPES: [&str; 2] = ["master", "release"];

/// Marketplace/catalog adapter
pub struct DiscogsProvider {
    ctx: ProviderContext,
    base_url: String,
    token: Option<String>,
}

impl DiscogsProvider {
    pub fn new(ctx: ProviderContext, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
            token,
        }
    }

    /// Releases credited to `artist`, sorted by year upstream
    pub async fn artist_releases(&self, artist: &str) -> Vec<CatalogEntry> {
        let Some(token) = self.token.as_deref() else {
            debug!(artist = %artist, "Discogs token not configured, skipping");
            return Vec::new();
        };

        let key = keys::releases(artist);
        if let Some(CachedValue::Releases(releases)) = self.ctx.cache.get(&key).await {
            return releases;
        }

        let Some(artist_id) = self.resolve_artist(artist, token).await else {
            return Vec::new();
        };

        let per_page = RELEASES_PER_PAGE.to_string();
        let Some(url) = build_url(
            PROVIDER,
            &self.base_url,
            &["artists", artist_id.as_str(), "releases"],
            &[("sort", "year"), ("per_page", per_page.as_str())],
        ) else {
            return Vec::new();
        };

        let body = self.ctx.fetcher.fetch_json(&url, &self.headers()).await;
        let releases = ProviderResponse::from_body(body, parse_releases)
            .into_option(PROVIDER, "artist releases")
            .unwrap_or_default();

        debug!(artist = %artist, artist_id = %artist_id, count = releases.len(), "Discogs releases");

        if !releases.is_empty() {
            self.ctx
                .cache
                .put(&key, CachedValue::Releases(releases.clone()))
                .await;
        }
        releases
    }

    fn headers(&self) -> [(&'static str, String); 1] {
        [("User-Agent", self.ctx.user_agent.clone())]
    }

    async fn resolve_artist(&self, artist: &str, token: &str) -> Option<String> {
        let url = build_url(
            PROVIDER,
            &self.base_url,
            &["database", "search"],
            &[("type", "artist"), ("q", artist), ("token", token)],
        )?;

        let body = self.ctx.fetcher.fetch_json(&url, &self.headers()).await;
        ProviderResponse::from_body(body, parse_artist_search).into_option(PROVIDER, "artist search")
    }
}

/// Id of the first artist search hit
pub(crate) fn parse_artist_search(body: &Value) -> Result<String, ShapeError> {
    let results = non_empty_array(body, "results")?;
    opt_id(&results[0], "id").ok_or(ShapeError::Missing("results[0].id"))
}

/// Master and release entries of an artist's release listing
pub(crate) fn parse_releases(body: &Value) -> Result<Vec<CatalogEntry>, ShapeError> {
    let releases = array(body, "releases")?;

    Ok(releases
        .iter()
        .filter(|release| {
            release
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|kind| KEPT_RELEASE_TYPES.contains(&kind))
        })
        .map(|release| CatalogEntry {
            title: opt_string(release, "title"),
            id: release_id(release.get("id")),
            year: release.get("year").and_then(Value::as_i64),
        })
        .collect())
}

fn release_id(value: Option<&Value>) -> Option<ReleaseId> {
    match value? {
        Value::Number(n) => n.as_i64().map(ReleaseId::Number),
        Value::String(s) => Some(ReleaseId::Text(s.clone())),
        _ => None,
    }
}
