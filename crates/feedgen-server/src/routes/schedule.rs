//! Schedule Routes

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use feedgen::ScheduleInterval;

use super::error::{ApiError, ErrorBody};
use crate::models::{PutScheduleRequest, ScheduleResponse};
use crate::AppState;

/// Get the feed's schedule
#[utoipa::path(
    get,
    path = "/feeds/{id}/schedule",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 200, description = "Schedule found", body = ScheduleResponse),
        (status = 404, description = "No schedule", body = ErrorBody)
    ),
    tag = "Schedule"
)]
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let schedule = state.feeds.get_schedule(id).await?;
    Ok(Json(ScheduleResponse::from_domain(schedule)))
}

/// Create or update the feed's schedule
#[utoipa::path(
    put,
    path = "/feeds/{id}/schedule",
    params(("id" = Uuid, Path, description = "Feed ID")),
    request_body = PutScheduleRequest,
    responses(
        (status = 200, description = "Schedule saved", body = ScheduleResponse),
        (status = 400, description = "Unsupported interval", body = ErrorBody),
        (status = 404, description = "Feed not found", body = ErrorBody)
    ),
    tag = "Schedule"
)]
pub async fn put_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PutScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let interval = payload
        .interval_hours
        .map(ScheduleInterval::try_from)
        .transpose()
        .map_err(ApiError::config)?;

    let schedule = state.feeds.put_schedule(id, payload.enabled, interval).await?;
    Ok(Json(ScheduleResponse::from_domain(schedule)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/feeds/:id/schedule", get(get_schedule).put(put_schedule))
}
