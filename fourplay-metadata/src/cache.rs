//! Process-wide provider response cache
//!
//! Entries expire lazily: an entry older than the TTL reads as absent and is
//! only replaced on the next `put` (or removed by the optional sweeper).
//! Callers cannot tell "never cached" from "expired".
//!
//! Time is measured with `tokio::time::Instant`, so tests can pause and
//! advance the clock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::models::{CatalogEntry, RawRecording, SimilarArtist, SimilarTrack};

/// Default entry time-to-live (1 hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache key builders, one namespace per provider query
///
/// Artist and title are lower-cased so lookups are case-insensitive.
pub mod keys {
    pub fn recording(artist: &str, title: &str) -> String {
        format!("mb_rec::{}::{}", artist.to_lowercase(), title.to_lowercase())
    }

    pub fn similar_artists(artist: &str) -> String {
        format!("lb_sim::{}", artist.to_lowercase())
    }

    pub fn releases(artist: &str) -> String {
        format!("disc_releases::{}", artist.to_lowercase())
    }

    pub fn similar_tracks(artist: &str, title: &str) -> String {
        format!("lfm_sim::{}::{}", artist.to_lowercase(), title.to_lowercase())
    }

    pub fn top_tracks(artist: &str) -> String {
        format!("lfm_top::{}", artist.to_lowercase())
    }
}

/// Normalized provider record as stored in the cache
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Recording(RawRecording),
    SimilarArtists(Vec<SimilarArtist>),
    Releases(Vec<CatalogEntry>),
    SimilarTracks(Vec<SimilarTrack>),
    TopTracks(Vec<String>),
}

/// Cache capability injected into the provider adapters
#[async_trait]
pub trait MetadataCache: Send + Sync {
    /// Value most recently stored under `key`, unless it has expired
    async fn get(&self, key: &str) -> Option<CachedValue>;

    /// Store `value` under `key`, stamping it with the current time
    async fn put(&self, key: &str, value: CachedValue);

    /// Number of stored entries, expired ones included
    async fn len(&self) -> usize;

    /// Drop expired entries, returning how many were removed
    async fn purge_expired(&self) -> usize;
}

/// Timestamp and value are stored together so readers never see a torn pair
#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    value: CachedValue,
}

/// In-memory TTL cache guarded by a single `RwLock`
pub struct InMemoryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_valid(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) <= self.ttl
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl MetadataCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<CachedValue> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        if self.is_valid(entry, Instant::now()) {
            debug!(key = %key, "Cache hit");
            Some(entry.value.clone())
        } else {
            debug!(key = %key, "Cache entry expired");
            None
        }
    }

    async fn put(&self, key: &str, value: CachedValue) {
        let entry = CacheEntry {
            stored_at: Instant::now(),
            value,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| self.is_valid(entry, now));
        before - entries.len()
    }
}

/// Periodically purge expired entries
///
/// Lazy expiry stays the contract; this only bounds memory held by
/// entries nobody asks for again.
pub fn spawn_cache_sweeper(cache: Arc<dyn MetadataCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.purge_expired().await;
            if removed > 0 {
                debug!(removed, "Purged expired cache entries");
            }
        }
    })
}
