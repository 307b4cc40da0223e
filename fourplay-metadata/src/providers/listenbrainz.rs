//! ListenBrainz similar-artist lookup
//!
//! Two sequential calls:
//! 1. `{base}/1/search/artist?q=<artist>&limit=1` resolves the artist MBID
//! 2. `{base}/1/artist/<mbid>/similar-artists` lists similar artists

use serde_json::Value;
use tracing::debug;

use super::{
    array, build_url, non_empty_array, opt_id, opt_string, score, ProviderContext,
    ProviderResponse, ShapeError,
};
use crate::cache::{keys, CachedValue};
use crate::models::SimilarArtist;

pub const PROVIDER: &str = "listenbrainz";

/// Maximum similar artists kept, in provider order
pub const MAX_SIMILAR_ARTISTS: usize = 10;

/// Listener-similarity adapter
pub struct ListenBrainzProvider {
    ctx: ProviderContext,
    base_url: String,
}

impl ListenBrainzProvider {
    pub fn new(ctx: ProviderContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Similar artists for `artist`, empty when anything is unavailable
    pub async fn similar_artists(&self, artist: &str) -> Vec<SimilarArtist> {
        let key = keys::similar_artists(artist);
        if let Some(CachedValue::SimilarArtists(similar)) = self.ctx.cache.get(&key).await {
            return similar;
        }

        let Some(mbid) = self.resolve_artist(artist).await else {
            return Vec::new();
        };

        let Some(url) = build_url(
            PROVIDER,
            &self.base_url,
            &["1", "artist", mbid.as_str(), "similar-artists"],
            &[],
        ) else {
            return Vec::new();
        };

        let body = self.ctx.fetcher.fetch_json(&url, &[]).await;
        let similar = ProviderResponse::from_body(body, parse_similar_artists)
            .into_option(PROVIDER, "similar artists")
            .unwrap_or_default();

        debug!(artist = %artist, mbid = %mbid, count = similar.len(), "ListenBrainz similar artists");

        if !similar.is_empty() {
            self.ctx
                .cache
                .put(&key, CachedValue::SimilarArtists(similar.clone()))
                .await;
        }
        similar
    }

    async fn resolve_artist(&self, artist: &str) -> Option<String> {
        let url = build_url(
            PROVIDER,
            &self.base_url,
            &["1", "search", "artist"],
            &[("q", artist), ("limit", "1")],
        )?;

        let body = self.ctx.fetcher.fetch_json(&url, &[]).await;
        ProviderResponse::from_body(body, parse_artist_search).into_option(PROVIDER, "artist search")
    }
}

/// MBID of the first artist search hit
pub(crate) fn parse_artist_search(body: &Value) -> Result<String, ShapeError> {
    let artists = non_empty_array(body, "artists")?;
    opt_id(&artists[0], "mbid").ok_or(ShapeError::Missing("artists[0].mbid"))
}

/// Top similar artists in provider order; `score` is kept as sent
pub(crate) fn parse_similar_artists(body: &Value) -> Result<Vec<SimilarArtist>, ShapeError> {
    let entries = array(body, "similar_artists")?;

    Ok(entries
        .iter()
        .take(MAX_SIMILAR_ARTISTS)
        .filter(|entry| entry.is_object())
        .map(|entry| SimilarArtist {
            name: opt_string(entry, "artist_name").unwrap_or_default(),
            score: score(entry.get("score")),
        })
        .collect())
}
