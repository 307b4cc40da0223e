//! Metadata aggregation across the four providers
//!
//! Validates the request, fans out to every adapter concurrently (one task per
//! provider), then assembles the bundle. A provider that fails or returns
//! nothing contributes empty/zero values; it never aborts the other branches.
//! Only a task that dies outright (panic, cancellation) fails the request.

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{info, Instrument, Span};

use fourplay_common::config::{Credentials, ProviderUrls};

use crate::models::{ArtistSimilarity, CatalogSummary, MetadataBundle, MetadataRequest};
use crate::providers::{
    DiscogsProvider, LastFmProvider, ListenBrainzProvider, MusicBrainzProvider, ProviderContext,
};

/// Validation message for a request without artist or title
pub const MISSING_ARTIST_TITLE: &str = "Missing artist/title";

#[derive(Debug, Error)]
pub enum AggregateError {
    /// Required input absent; no provider was called
    #[error("{}", MISSING_ARTIST_TITLE)]
    MissingArtistTitle,

    /// Bundle assembly failed in a way provider degradation cannot absorb
    #[error("{0}")]
    Unexpected(String),
}

impl From<JoinError> for AggregateError {
    fn from(err: JoinError) -> Self {
        AggregateError::Unexpected(err.to_string())
    }
}

/// Fan-out orchestrator owning one adapter per provider
pub struct Aggregator {
    musicbrainz: Arc<MusicBrainzProvider>,
    listenbrainz: Arc<ListenBrainzProvider>,
    discogs: Arc<DiscogsProvider>,
    lastfm: Arc<LastFmProvider>,
}

impl Aggregator {
    pub fn new(ctx: ProviderContext, urls: &ProviderUrls, credentials: &Credentials) -> Self {
        Self {
            musicbrainz: Arc::new(MusicBrainzProvider::new(ctx.clone(), &urls.musicbrainz)),
            listenbrainz: Arc::new(ListenBrainzProvider::new(ctx.clone(), &urls.listenbrainz)),
            discogs: Arc::new(DiscogsProvider::new(
                ctx.clone(),
                &urls.discogs,
                credentials.discogs_token.clone(),
            )),
            lastfm: Arc::new(LastFmProvider::new(
                ctx,
                &urls.lastfm,
                credentials.lastfm_api_key.clone(),
            )),
        }
    }

    /// Build the metadata bundle for one request
    pub async fn aggregate(&self, request: MetadataRequest) -> Result<MetadataBundle, AggregateError> {
        if request.artist.is_empty() || request.title.is_empty() {
            return Err(AggregateError::MissingArtistTitle);
        }

        let artist: Arc<str> = Arc::from(request.artist.as_str());
        let title: Arc<str> = Arc::from(request.title.as_str());
        let span = Span::current();

        let recording_task = {
            let provider = self.musicbrainz.clone();
            let (artist, title) = (artist.clone(), title.clone());
            tokio::spawn(
                async move { provider.lookup_recording(&artist, &title).await }
                    .instrument(span.clone()),
            )
        };

        let similarity_task = {
            let provider = self.listenbrainz.clone();
            let artist = artist.clone();
            tokio::spawn(async move { provider.similar_artists(&artist).await }.instrument(span.clone()))
        };

        let catalog_task = {
            let provider = self.discogs.clone();
            let artist = artist.clone();
            tokio::spawn(async move { provider.artist_releases(&artist).await }.instrument(span.clone()))
        };

        let popularity_task = {
            let provider = self.lastfm.clone();
            let (artist, title) = (artist.clone(), title.clone());
            tokio::spawn(
                async move { provider.track_popularity(&artist, &title).await }.instrument(span),
            )
        };

        let (recording, similar, releases, popularity) =
            tokio::join!(recording_task, similarity_task, catalog_task, popularity_task);

        // Era score depends on the caller's year, so it is derived here and never cached
        let content_year = request.content_year.unwrap_or(0);
        let recording = recording?.map(|raw| raw.with_era_score(content_year));
        let similarity = ArtistSimilarity::from_similar(similar?);
        let catalog = CatalogSummary::from_releases(releases?);
        let popularity = popularity?;

        info!(
            artist = %artist,
            title = %title,
            recording_found = recording.is_some(),
            similar_artists = similarity.similar.len(),
            releases = catalog.releases.len(),
            top_tracks = popularity.top_tracks.len(),
            "Metadata bundle assembled"
        );

        Ok(MetadataBundle {
            artist: request.artist,
            title: request.title,
            candidate_year: request.year.unwrap_or(0),
            recording,
            similarity,
            catalog,
            popularity,
            genre: request.genre,
            scene: request.scene,
            error: None,
        })
    }
}
