//! Metadata aggregation endpoint
//!
//! `POST /fourplay/metadata` decodes the request, runs the aggregator and
//! encodes the bundle. Missing artist/title is a 400 with no provider calls;
//! an unexpected assembly failure is a 500 carrying its description.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregator::AggregateError;
use crate::error::{ApiError, ApiResult};
use crate::models::{MetadataBundle, MetadataRequest};
use crate::AppState;

/// POST /fourplay/metadata
pub async fn fetch_metadata(
    State(state): State<AppState>,
    payload: Result<Json<MetadataRequest>, JsonRejection>,
) -> ApiResult<Json<MetadataBundle>> {
    let span = info_span!("metadata_request", request_id = %Uuid::new_v4());

    async move {
        let Json(request) = payload.map_err(|rejection| {
            warn!(error = %rejection, "Rejected metadata request body");
            ApiError::BadRequest(rejection.body_text())
        })?;

        match state.aggregator.aggregate(request).await {
            Ok(bundle) => Ok(Json(bundle)),
            Err(AggregateError::MissingArtistTitle) => {
                warn!("Metadata request without artist/title");
                Err(AggregateError::MissingArtistTitle.into())
            }
            Err(AggregateError::Unexpected(msg)) => {
                error!(error = %msg, "Metadata aggregation failed");
                *state.last_error.write().await = Some(msg.clone());
                Err(ApiError::Internal(msg))
            }
        }
    }
    .instrument(span)
    .await
}
