use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{MatchResult, ProfileId, PropertyId};
use super::repository::{MatchingStore, RepositoryError};
use super::service::{MatchingService, MatchingServiceError};
use crate::workflows::feed::{FeedFormat, FeedImportError};

/// Router builder exposing the matching passes, scoring, and feed sync over HTTP.
pub fn matching_router<S>(service: Arc<MatchingService<S>>) -> Router
where
    S: MatchingStore + 'static,
{
    Router::new()
        .route("/api/v1/matching/run", post(run_handler::<S>))
        .route("/api/v1/matching/alerts/run", post(alerts_handler::<S>))
        .route("/api/v1/matching/score", post(score_handler::<S>))
        .route(
            "/api/v1/profiles/:profile_id/matches",
            get(profile_matches_handler::<S>),
        )
        .route("/api/v1/properties/feed", post(feed_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub property_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSyncRequest {
    pub format: FeedFormat,
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileMatchesView {
    pub profile_id: ProfileId,
    pub threshold: u8,
    pub matches: Vec<MatchResult>,
}

pub(crate) async fn run_handler<S>(State(service): State<Arc<MatchingService<S>>>) -> Response
where
    S: MatchingStore + 'static,
{
    match service.run(Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn alerts_handler<S>(State(service): State<Arc<MatchingService<S>>>) -> Response
where
    S: MatchingStore + 'static,
{
    match service.run_alerts(Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<MatchingService<S>>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    S: MatchingStore + 'static,
{
    let profile_id = ProfileId(request.profile_id);
    let property_id = PropertyId(request.property_id);
    match service.score_pair(&profile_id, &property_id) {
        Ok(breakdown) => (StatusCode::OK, axum::Json(breakdown)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn profile_matches_handler<S>(
    State(service): State<Arc<MatchingService<S>>>,
    Path(profile_id): Path<String>,
) -> Response
where
    S: MatchingStore + 'static,
{
    let profile_id = ProfileId(profile_id);
    match service.ranked_matches(&profile_id, None) {
        Ok(matches) => {
            let view = ProfileMatchesView {
                profile_id,
                threshold: service.config().match_threshold,
                matches,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn feed_handler<S>(
    State(service): State<Arc<MatchingService<S>>>,
    axum::Json(request): axum::Json<FeedSyncRequest>,
) -> Response
where
    S: MatchingStore + 'static,
{
    match service.sync_feed(request.format, request.payload.as_bytes()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &MatchingServiceError) -> StatusCode {
    match error {
        MatchingServiceError::Feed(FeedImportError::Repository(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        MatchingServiceError::InvalidInput(_) | MatchingServiceError::Feed(_) => {
            StatusCode::BAD_REQUEST
        }
        MatchingServiceError::Repository(RepositoryError::NotFound { .. }) => {
            StatusCode::NOT_FOUND
        }
        MatchingServiceError::Repository(RepositoryError::Conflict { .. }) => StatusCode::CONFLICT,
        MatchingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: MatchingServiceError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(%error, "matching request failed");
    }
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
