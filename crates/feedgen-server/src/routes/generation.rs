//! Generation Routes - Manual runs, previews and scheduler ticks

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::error::{ApiError, ErrorBody};
use crate::models::{
    PreviewQuery, RegenerateResponse, RunScheduledResponse, DEFAULT_PREVIEW_PRODUCTS,
};
use crate::AppState;

/// Number of records in a preview body
const PREVIEW_RECORDS_HEADER: HeaderName = HeaderName::from_static("x-feed-records");

/// Trigger a generation run
#[utoipa::path(
    post,
    path = "/feeds/{id}/regenerate",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 202, description = "Run started", body = RegenerateResponse),
        (status = 400, description = "Invalid or inactive feed configuration", body = ErrorBody),
        (status = 404, description = "Feed not found", body = ErrorBody),
        (status = 409, description = "A run is already in progress", body = ErrorBody)
    ),
    tag = "Generation"
)]
pub async fn regenerate_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<RegenerateResponse>), ApiError> {
    let run_id = state.generation.generate(id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RegenerateResponse {
            run_id,
            feed_id: id,
            status: "running".to_string(),
        }),
    ))
}

/// Render a bounded preview without recording a run
#[utoipa::path(
    get,
    path = "/feeds/{id}/preview",
    params(("id" = Uuid, Path, description = "Feed ID"), PreviewQuery),
    responses(
        (status = 200, description = "Feed file prefix; Content-Type follows the feed format"),
        (status = 400, description = "Invalid feed configuration", body = ErrorBody),
        (status = 404, description = "Feed not found", body = ErrorBody)
    ),
    tag = "Generation"
)]
pub async fn preview_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let max_products = query.max_products.unwrap_or(DEFAULT_PREVIEW_PRODUCTS);
    let preview = state.generation.preview(id, max_products).await?;

    Ok((
        [
            (header::CONTENT_TYPE, preview.format.content_type().to_string()),
            (PREVIEW_RECORDS_HEADER, preview.records.to_string()),
        ],
        preview.data,
    ))
}

/// Scheduler tick for external cron
#[utoipa::path(
    post,
    path = "/feeds/run-scheduled",
    responses(
        (status = 200, description = "Due schedules dispatched", body = RunScheduledResponse)
    ),
    tag = "Generation"
)]
pub async fn run_scheduled(State(state): State<AppState>) -> Json<RunScheduledResponse> {
    // A failed tick dispatches nothing; the next tick retries
    let dispatched = match state.scheduler.tick().await {
        Ok(report) => report.dispatched,
        Err(e) => {
            tracing::warn!("❌ Scheduler tick failed: {}", e);
            0
        }
    };
    Json(RunScheduledResponse { dispatched })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feeds/run-scheduled", post(run_scheduled))
        .route("/feeds/:id/regenerate", post(regenerate_feed))
        .route("/feeds/:id/preview", get(preview_feed))
}
