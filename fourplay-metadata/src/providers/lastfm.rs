//! Last.fm track popularity lookup
//!
//! Two independent calls against `{base}/2.0/`:
//! - `method=track.getSimilar&artist=..&track=..&limit=10` for similar tracks
//! - `method=artist.getTopTracks&artist=..&limit=5` for the artist's top tracks
//!
//! Both require the API key; without one the provider is skipped.

use serde_json::Value;
use tracing::debug;

use super::{build_url, field, opt_string, score, ProviderContext, ProviderResponse, ShapeError};
use crate::cache::{keys, CachedValue};
use crate::models::{SimilarTrack, TrackPopularity};

pub const PROVIDER: &str = "lastfm";

pub const MAX_SIMILAR_TRACKS: usize = 10;

pub const MAX_TOP_TRACKS: usize = 5;

/// Scrobble/popularity adapter
pub struct LastFmProvider {
    ctx: ProviderContext,
    base_url: String,
    api_key: Option<String>,
}

impl LastFmProvider {
    pub fn new(ctx: ProviderContext, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Similar tracks and top tracks, fetched concurrently
    pub async fn track_popularity(&self, artist: &str, title: &str) -> TrackPopularity {
        let (similar_tracks, top_tracks) =
            tokio::join!(self.similar_tracks(artist, title), self.top_tracks(artist));
        TrackPopularity::new(similar_tracks, top_tracks)
    }

    pub async fn similar_tracks(&self, artist: &str, title: &str) -> Vec<SimilarTrack> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!(artist = %artist, "Last.fm API key not configured, skipping similar tracks");
            return Vec::new();
        };

        let key = keys::similar_tracks(artist, title);
        if let Some(CachedValue::SimilarTracks(tracks)) = self.ctx.cache.get(&key).await {
            return tracks;
        }

        let limit = MAX_SIMILAR_TRACKS.to_string();
        let Some(url) = self.method_url(
            api_key,
            &[
                ("method", "track.getSimilar"),
                ("artist", artist),
                ("track", title),
                ("limit", limit.as_str()),
            ],
        ) else {
            return Vec::new();
        };

        let body = self.ctx.fetcher.fetch_json(&url, &[]).await;
        let tracks = ProviderResponse::from_body(body, parse_similar_tracks)
            .into_option(PROVIDER, "track.getSimilar")
            .unwrap_or_default();

        if !tracks.is_empty() {
            self.ctx
                .cache
                .put(&key, CachedValue::SimilarTracks(tracks.clone()))
                .await;
        }
        tracks
    }

    pub async fn top_tracks(&self, artist: &str) -> Vec<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!(artist = %artist, "Last.fm API key not configured, skipping top tracks");
            return Vec::new();
        };

        let key = keys::top_tracks(artist);
        if let Some(CachedValue::TopTracks(tracks)) = self.ctx.cache.get(&key).await {
            return tracks;
        }

        let limit = MAX_TOP_TRACKS.to_string();
        let Some(url) = self.method_url(
            api_key,
            &[
                ("method", "artist.getTopTracks"),
                ("artist", artist),
                ("limit", limit.as_str()),
            ],
        ) else {
            return Vec::new();
        };

        let body = self.ctx.fetcher.fetch_json(&url, &[]).await;
        let tracks = ProviderResponse::from_body(body, parse_top_tracks)
            .into_option(PROVIDER, "artist.getTopTracks")
            .unwrap_or_default();

        if !tracks.is_empty() {
            self.ctx
                .cache
                .put(&key, CachedValue::TopTracks(tracks.clone()))
                .await;
        }
        tracks
    }

    fn method_url(&self, api_key: &str, params: &[(&str, &str)]) -> Option<reqwest::Url> {
        let mut all_params = params.to_vec();
        all_params.push(("api_key", api_key));
        all_params.push(("format", "json"));
        build_url(PROVIDER, &self.base_url, &["2.0", ""], &all_params)
    }
}

/// `<container>.track`, which Last.fm sends as an object when there is a single hit
fn track_list<'a>(
    body: &'a Value,
    container: &'static str,
) -> Result<Vec<&'a Value>, ShapeError> {
    let track = field(field(body, container)?, "track")?;
    match track {
        Value::Array(tracks) => Ok(tracks.iter().collect()),
        Value::Object(_) => Ok(vec![track]),
        _ => Err(ShapeError::Malformed("track")),
    }
}

/// Similar tracks; entries without an artist name are dropped, `match` is kept as sent
pub(crate) fn parse_similar_tracks(body: &Value) -> Result<Vec<SimilarTrack>, ShapeError> {
    let tracks = track_list(body, "similartracks")?;

    Ok(tracks
        .into_iter()
        .take(MAX_SIMILAR_TRACKS)
        .filter_map(|track| {
            let artist = track.get("artist").and_then(|a| opt_string(a, "name"))?;
            Some(SimilarTrack {
                artist,
                title: opt_string(track, "name"),
                match_score: score(track.get("match")),
            })
        })
        .collect())
}

/// Top track names; entries without a name are dropped
pub(crate) fn parse_top_tracks(body: &Value) -> Result<Vec<String>, ShapeError> {
    let tracks = track_list(body, "toptracks")?;

    Ok(tracks
        .into_iter()
        .take(MAX_TOP_TRACKS)
        .filter_map(|track| opt_string(track, "name"))
        .collect())
}
