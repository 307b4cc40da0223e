//! Request, normalized record and response bundle types
//!
//! All records are request-scoped except the ones held by the cache
//! (see [`crate::cache::CachedValue`]). Serialized field names are camelCase.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::scoring;

// ============================================================================
// Inbound request
// ============================================================================

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// `null` reads the same as an absent field
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Year sent as any whole JSON number, `2000` or `2000.0`
fn whole_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(year)
            if year.fract() == 0.0
                && year >= f64::from(i32::MIN)
                && year <= f64::from(i32::MAX) =>
        {
            Ok(Some(year as i32))
        }
        Some(year) => Err(de::Error::custom(format!(
            "year must be a whole number, got {}",
            year
        ))),
    }
}

/// Body of `POST /fourplay/metadata`
///
/// `artist` and `title` default to empty strings (absent or `null`) so that a
/// missing field surfaces as a validation failure rather than a decode failure.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artist: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,

    /// Year of the surrounding content the track is scored against (0 = unknown)
    #[serde(default, deserialize_with = "whole_year")]
    pub content_year: Option<i32>,

    /// Candidate's own year, echoed back as `candidateYear`
    #[serde(default, deserialize_with = "whole_year")]
    pub year: Option<i32>,

    #[serde(default = "empty_object")]
    pub genre: Value,

    #[serde(default = "empty_object")]
    pub scene: Value,
}

impl MetadataRequest {
    /// Minimal request for an artist/title pair
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            content_year: None,
            year: None,
            genre: empty_object(),
            scene: empty_object(),
        }
    }

    pub fn with_content_year(mut self, content_year: i32) -> Self {
        self.content_year = Some(content_year);
        self
    }
}

// ============================================================================
// Recording identity (MusicBrainz)
// ============================================================================

/// Context-independent recording record, safe to cache
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRecording {
    pub recording_id: Option<String>,
    pub artist_id: Option<String>,
    /// First release year (0 = unknown)
    pub release_year: i32,
    /// 0.5 when the registry reports any relation data, else 0
    pub relation_score: f64,
}

impl RawRecording {
    /// Derive the per-request record for the caller's content year
    pub fn with_era_score(self, content_year: i32) -> RecordingInfo {
        let era_score = scoring::era_score(self.release_year, content_year);
        RecordingInfo {
            raw: self,
            era_score,
        }
    }
}

/// Recording record with the request-dependent era score applied
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInfo {
    #[serde(flatten)]
    pub raw: RawRecording,
    pub era_score: f64,
}

// ============================================================================
// Artist similarity (ListenBrainz)
// ============================================================================

/// One similar artist; `score` is passed through from upstream unvalidated
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimilarArtist {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSimilarity {
    /// Provider order preserved, at most 10 entries
    pub similar: Vec<SimilarArtist>,
    /// 1 when any similar artist was found
    pub overlap: u8,
    /// Similar-artist count proxy in [0, 1]; upstream exposes no listener count
    pub listener_weight: f64,
}

impl ArtistSimilarity {
    pub fn from_similar(similar: Vec<SimilarArtist>) -> Self {
        let count = similar.len();
        Self {
            similar,
            overlap: scoring::overlap(count),
            listener_weight: scoring::listener_weight(count),
        }
    }
}

impl Default for ArtistSimilarity {
    fn default() -> Self {
        Self::from_similar(Vec::new())
    }
}

// ============================================================================
// Catalog (Discogs)
// ============================================================================

/// Discogs identifiers are numeric, but nothing upstream guarantees it
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ReleaseId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogEntry {
    pub title: Option<String>,
    pub id: Option<ReleaseId>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub releases: Vec<CatalogEntry>,
    pub style_score: f64,
    pub continuity_score: f64,
}

impl CatalogSummary {
    pub fn from_releases(releases: Vec<CatalogEntry>) -> Self {
        let style_score = scoring::style_score(releases.len());
        Self {
            releases,
            style_score,
            continuity_score: scoring::continuity_score(style_score),
        }
    }
}

impl Default for CatalogSummary {
    fn default() -> Self {
        Self::from_releases(Vec::new())
    }
}

// ============================================================================
// Track popularity (Last.fm)
// ============================================================================

/// One similar track; `match` is passed through from upstream unvalidated
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimilarTrack {
    pub artist: String,
    pub title: Option<String>,
    #[serde(rename = "match")]
    pub match_score: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackPopularity {
    pub similar_tracks: Vec<SimilarTrack>,
    pub top_tracks: Vec<String>,
    pub popularity: f64,
}

impl TrackPopularity {
    pub fn new(similar_tracks: Vec<SimilarTrack>, top_tracks: Vec<String>) -> Self {
        let popularity = scoring::popularity(top_tracks.len());
        Self {
            similar_tracks,
            top_tracks,
            popularity,
        }
    }
}

impl Default for TrackPopularity {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

// ============================================================================
// Response bundle
// ============================================================================

/// Unified response for one artist/title query
///
/// Always shape-complete: unavailable providers contribute empty/zero values.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBundle {
    pub artist: String,
    pub title: String,
    pub candidate_year: i32,
    pub recording: Option<RecordingInfo>,
    pub similarity: ArtistSimilarity,
    pub catalog: CatalogSummary,
    pub popularity: TrackPopularity,
    pub genre: Value,
    pub scene: Value,
    pub error: Option<String>,
}
