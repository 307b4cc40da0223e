//! MusicBrainz recording lookup
//!
//! Single search by artist + title, first result only.
//! Endpoint: `{base}/recording?query=recording:"<title>" AND artist:"<artist>"&fmt=json&limit=1`
//! MusicBrainz requires a descriptive User-Agent.

use serde_json::Value;
use tracing::debug;

use super::{build_url, non_empty_array, opt_id, opt_string, ProviderContext, ProviderResponse, ShapeError};
use crate::cache::{keys, CachedValue};
use crate::models::RawRecording;
use crate::scoring::{extract_year, relation_score};

pub const PROVIDER: &str = "musicbrainz";

/// Recording-identity adapter
pub struct MusicBrainzProvider {
    ctx: ProviderContext,
    base_url: String,
}

impl MusicBrainzProvider {
    pub fn new(ctx: ProviderContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Look up the best-matching recording for an artist/title pair
    ///
    /// The returned record is context-independent; the era score is
    /// derived per request by the aggregator.
    pub async fn lookup_recording(&self, artist: &str, title: &str) -> Option<RawRecording> {
        let key = keys::recording(artist, title);
        if let Some(CachedValue::Recording(recording)) = self.ctx.cache.get(&key).await {
            return Some(recording);
        }

        let query = format!(
            "recording:\"{}\" AND artist:\"{}\"",
            escape_phrase(title),
            escape_phrase(artist)
        );
        let url = build_url(
            PROVIDER,
            &self.base_url,
            &["recording"],
            &[("query", query.as_str()), ("fmt", "json"), ("limit", "1")],
        )?;

        debug!(artist = %artist, title = %title, "Querying MusicBrainz recording search");

        let headers = [("User-Agent", self.ctx.user_agent.clone())];
        let body = self.ctx.fetcher.fetch_json(&url, &headers).await;
        let recording = ProviderResponse::from_body(body, parse_recording_search)
            .into_option(PROVIDER, "recording search")?;

        self.ctx
            .cache
            .put(&key, CachedValue::Recording(recording.clone()))
            .await;
        Some(recording)
    }
}

/// Escape a value for use inside a Lucene phrase query
fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Interpret a recording search response, keeping only the first hit
pub(crate) fn parse_recording_search(body: &Value) -> Result<RawRecording, ShapeError> {
    let recordings = non_empty_array(body, "recordings")?;
    let recording = &recordings[0];
    if !recording.is_object() {
        return Err(ShapeError::Malformed("recordings"));
    }

    let artist_id = recording
        .get("artist-credit")
        .and_then(Value::as_array)
        .and_then(|credits| credits.first())
        .and_then(|credit| credit.get("artist"))
        .and_then(|artist| opt_id(artist, "id"));

    let release_year = match recording.get("first-release-date") {
        Some(Value::String(date)) => extract_year(date),
        Some(Value::Number(year)) => extract_year(&year.to_string()),
        _ => 0,
    };

    let has_relations = match recording.get("relations") {
        Some(Value::Array(relations)) => !relations.is_empty(),
        Some(Value::Object(relations)) => !relations.is_empty(),
        _ => false,
    };

    Ok(RawRecording {
        recording_id: opt_string(recording, "id"),
        artist_id,
        release_year,
        relation_score: relation_score(has_relations),
    })
}
