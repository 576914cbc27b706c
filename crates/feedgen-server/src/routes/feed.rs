//! Feed Routes - Configuration, history and downloads

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use feedgen::{Channel, FeedFormat, FeedSettings, FeedStatus};

use super::error::{ApiError, ErrorBody};
use crate::application::FeedUpdate;
use crate::models::{
    parse_settings, CreateFeedRequest, FeedResponse, ListQuery, RunResponse, UpdateFeedRequest,
};
use crate::AppState;

/// Create a feed
#[utoipa::path(
    post,
    path = "/feeds",
    request_body = CreateFeedRequest,
    responses(
        (status = 200, description = "Feed created", body = FeedResponse),
        (status = 400, description = "Unsupported channel/format pair or invalid filter", body = ErrorBody)
    ),
    tag = "Feed"
)]
pub async fn create_feed(
    State(state): State<AppState>,
    Json(payload): Json<CreateFeedRequest>,
) -> Result<Json<FeedResponse>, ApiError> {
    let channel = payload.channel.parse::<Channel>().map_err(ApiError::config)?;
    let format = payload.format.parse::<FeedFormat>().map_err(ApiError::config)?;
    let settings = match payload.settings {
        Some(raw) => parse_settings(raw).map_err(ApiError::config)?,
        None => FeedSettings::default(),
    };

    let feed = state
        .feeds
        .create(payload.tenant_id, payload.name, channel, format, settings)
        .await?;

    Ok(Json(FeedResponse::from_domain(feed)))
}

/// Get feed by ID
#[utoipa::path(
    get,
    path = "/feeds/{id}",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 200, description = "Feed found", body = FeedResponse),
        (status = 404, description = "Feed not found", body = ErrorBody)
    ),
    tag = "Feed"
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedResponse>, ApiError> {
    let feed = state.feeds.get(id).await?;
    Ok(Json(FeedResponse::from_domain(feed)))
}

/// Update feed name, settings or status
#[utoipa::path(
    put,
    path = "/feeds/{id}",
    params(("id" = Uuid, Path, description = "Feed ID")),
    request_body = UpdateFeedRequest,
    responses(
        (status = 200, description = "Feed updated", body = FeedResponse),
        (status = 400, description = "Invalid settings or status", body = ErrorBody),
        (status = 404, description = "Feed not found", body = ErrorBody),
        (status = 409, description = "Feed is generating", body = ErrorBody)
    ),
    tag = "Feed"
)]
pub async fn update_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFeedRequest>,
) -> Result<Json<FeedResponse>, ApiError> {
    let settings = payload
        .settings
        .map(parse_settings)
        .transpose()
        .map_err(ApiError::config)?;
    let status = payload
        .status
        .map(|s| s.parse::<FeedStatus>())
        .transpose()
        .map_err(ApiError::config)?;

    let update = FeedUpdate {
        name: payload.name,
        settings,
        status,
    };
    let feed = state.feeds.update(id, update).await?;

    Ok(Json(FeedResponse::from_domain(feed)))
}

/// Download the latest generated artifact
#[utoipa::path(
    get,
    path = "/feeds/{id}/download",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 200, description = "Feed file; Content-Type follows the feed format"),
        (status = 404, description = "Feed never generated", body = ErrorBody)
    ),
    tag = "Feed"
)]
pub async fn download_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let artifact = state.feeds.download(id).await?;
    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        id,
        artifact.format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, artifact.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.data,
    ))
}

/// List generation runs, newest first
#[utoipa::path(
    get,
    path = "/feeds/{id}/history",
    params(("id" = Uuid, Path, description = "Feed ID"), ListQuery),
    responses(
        (status = 200, description = "Generation history", body = Vec<RunResponse>),
        (status = 404, description = "Feed not found", body = ErrorBody)
    ),
    tag = "Feed"
)]
pub async fn feed_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RunResponse>>, ApiError> {
    let runs = state.feeds.history(id, query.limit).await?;
    Ok(Json(runs.into_iter().map(RunResponse::from_domain).collect()))
}

/// Get one generation run
#[utoipa::path(
    get,
    path = "/feeds/{id}/runs/{run_id}",
    params(
        ("id" = Uuid, Path, description = "Feed ID"),
        ("run_id" = Uuid, Path, description = "Run ID returned by regenerate")
    ),
    responses(
        (status = 200, description = "Run found", body = RunResponse),
        (status = 404, description = "Run not found", body = ErrorBody)
    ),
    tag = "Feed"
)]
pub async fn get_run(
    State(state): State<AppState>,
    Path((id, run_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = state.feeds.run(id, run_id).await?;
    Ok(Json(RunResponse::from_domain(run)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feeds", post(create_feed))
        .route("/feeds/:id", get(get_feed).put(update_feed))
        .route("/feeds/:id/download", get(download_feed))
        .route("/feeds/:id/history", get(feed_history))
        .route("/feeds/:id/runs/:run_id", get(get_run))
}
