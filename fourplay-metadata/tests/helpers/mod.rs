//! Shared test helpers: scripted fetcher double, provider fixtures, request builders

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use fourplay_common::config::{Credentials, TomlConfig};
use fourplay_metadata::fetcher::{Headers, JsonFetcher};
use http_body_util::BodyExt;
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const MB_HOST: &str = "mb.test";
pub const LB_HOST: &str = "lb.test";
pub const DISCOGS_HOST: &str = "discogs.test";
pub const LASTFM_HOST: &str = "lastfm.test";

/// Fetcher double answering from a route table and recording every call
///
/// Routes are keyed by `host + path`, plus `?<method>` when the URL carries a
/// Last.fm style `method` parameter. Unknown routes answer `None`, the same
/// signal the real fetcher gives after exhausting its attempts.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: HashMap<String, Value>,
    panic_hosts: HashSet<String>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: &str, body: Value) -> Self {
        self.routes.insert(key.to_string(), body);
        self
    }

    /// Make every request to `host` panic
    pub fn panic_on(mut self, host: &str) -> Self {
        self.panic_hosts.insert(host.to_string());
        self
    }

    /// Routes for all four providers answering with data
    pub fn all_providers() -> Self {
        Self::new()
            .route("mb.test/recording", musicbrainz_recording())
            .route("lb.test/1/search/artist", json!({"artists": [{"mbid": "mbid-1"}]}))
            .route("lb.test/1/artist/mbid-1/similar-artists", listenbrainz_similar(4))
            .route("discogs.test/database/search", json!({"results": [{"id": 42}]}))
            .route("discogs.test/artists/42/releases", discogs_releases(25))
            .route("lastfm.test/2.0/?track.getSimilar", lastfm_similar_tracks(3))
            .route("lastfm.test/2.0/?artist.getTopTracks", lastfm_top_tracks(5))
    }

    /// Remove every route of `host`, as if it were unreachable
    pub fn without_host(mut self, host: &str) -> Self {
        self.routes.retain(|key, _| !key.starts_with(host));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, host: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.host_str() == Some(host))
            .count()
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }

    fn route_key(url: &Url) -> String {
        let host = url.host_str().unwrap_or_default();
        let method = url
            .query_pairs()
            .find(|(name, _)| name == "method")
            .map(|(_, value)| format!("?{}", value))
            .unwrap_or_default();
        format!("{}{}{}", host, url.path(), method)
    }
}

#[async_trait]
impl JsonFetcher for ScriptedFetcher {
    async fn fetch_json(&self, url: &Url, _headers: &Headers) -> Option<Value> {
        self.calls.lock().unwrap().push(url.clone());

        if let Some(host) = url.host_str() {
            if self.panic_hosts.contains(host) {
                panic!("scripted provider failure for {}", host);
            }
        }

        self.routes.get(&Self::route_key(url)).cloned()
    }
}

// ============================================================================
// Configuration
// ============================================================================

pub fn test_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.providers.musicbrainz = format!("http://{}", MB_HOST);
    config.providers.listenbrainz = format!("http://{}", LB_HOST);
    config.providers.discogs = format!("http://{}", DISCOGS_HOST);
    config.providers.lastfm = format!("http://{}", LASTFM_HOST);
    config
}

pub fn test_credentials() -> Credentials {
    Credentials {
        lastfm_api_key: Some("test-lastfm-key".to_string()),
        discogs_token: Some("test-discogs-token".to_string()),
    }
}

// ============================================================================
// Provider fixtures
// ============================================================================

pub fn musicbrainz_recording() -> Value {
    json!({
        "count": 1,
        "recordings": [{
            "id": "rec-mbid",
            "title": "Test Song",
            "first-release-date": "1995-06-01",
            "artist-credit": [{"name": "Test Artist", "artist": {"id": "artist-mbid", "name": "Test Artist"}}],
            "relations": [{"type": "performance"}]
        }]
    })
}

pub fn listenbrainz_similar(count: usize) -> Value {
    let entries: Vec<Value> = (0..count)
        .map(|i| json!({"artist_mbid": format!("sim-{}", i), "artist_name": format!("Similar {}", i), "score": 1000 - i}))
        .collect();
    json!({ "similar_artists": entries })
}

pub fn discogs_releases(count: usize) -> Value {
    let entries: Vec<Value> = (0..count)
        .map(|i| json!({"type": "master", "title": format!("Album {}", i), "id": i, "year": 1990 + i}))
        .collect();
    json!({ "releases": entries })
}

pub fn lastfm_similar_tracks(count: usize) -> Value {
    let entries: Vec<Value> = (0..count)
        .map(|i| json!({"name": format!("Track {}", i), "match": 1.0 - (i as f64) / 10.0, "artist": {"name": format!("Other {}", i)}}))
        .collect();
    json!({ "similartracks": { "track": entries } })
}

pub fn lastfm_top_tracks(count: usize) -> Value {
    let entries: Vec<Value> = (0..count).map(|i| json!({"name": format!("Hit {}", i)})).collect();
    json!({ "toptracks": { "track": entries } })
}

// ============================================================================
// HTTP helpers
// ============================================================================

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
