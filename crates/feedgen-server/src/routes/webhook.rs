//! Webhook Routes - Feed notifications
//!
//! One subscription per feed; deliveries run through the outbox dispatcher.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::error::{ApiError, ErrorBody};
use crate::application::WebhookUpdate;
use crate::models::{
    parse_event_types, ListQuery, PutWebhookRequest, WebhookDeliveryResponse, WebhookResponse,
    WebhookTestResponse,
};
use crate::AppState;

/// Get the feed's webhook
#[utoipa::path(
    get,
    path = "/feeds/{id}/webhook",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 200, description = "Webhook found", body = WebhookResponse),
        (status = 404, description = "No webhook", body = ErrorBody)
    ),
    tag = "Webhook"
)]
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let subscription = state.feeds.get_webhook(id).await?;
    Ok(Json(WebhookResponse::from_domain(subscription)))
}

/// Create or update the feed's webhook
#[utoipa::path(
    put,
    path = "/feeds/{id}/webhook",
    params(("id" = Uuid, Path, description = "Feed ID")),
    request_body = PutWebhookRequest,
    responses(
        (status = 200, description = "Webhook saved", body = WebhookResponse),
        (status = 400, description = "Invalid URL, events or limits", body = ErrorBody),
        (status = 404, description = "Feed not found", body = ErrorBody)
    ),
    tag = "Webhook"
)]
pub async fn put_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PutWebhookRequest>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let events = payload
        .events
        .map(parse_event_types)
        .transpose()
        .map_err(ApiError::config)?;

    let update = WebhookUpdate {
        url: payload.url,
        secret: payload.secret,
        enabled: payload.enabled,
        events,
        retry_count: payload.retry_count,
        timeout_seconds: payload.timeout_seconds,
    };
    let subscription = state.feeds.put_webhook(id, update).await?;

    Ok(Json(WebhookResponse::from_domain(subscription)))
}

/// Queue a `feed.validated` test event
#[utoipa::path(
    post,
    path = "/feeds/{id}/webhook/test",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 202, description = "Test event queued", body = WebhookTestResponse),
        (status = 400, description = "Subscription does not receive feed.validated", body = ErrorBody),
        (status = 404, description = "No webhook", body = ErrorBody)
    ),
    tag = "Webhook"
)]
pub async fn test_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<WebhookTestResponse>), ApiError> {
    let queued = state.feeds.test_webhook(id).await?;
    Ok((StatusCode::ACCEPTED, Json(WebhookTestResponse::from_domain(queued))))
}

/// Recent delivery attempts, newest first
#[utoipa::path(
    get,
    path = "/feeds/{id}/webhook/deliveries",
    params(("id" = Uuid, Path, description = "Feed ID"), ListQuery),
    responses(
        (status = 200, description = "Delivery journal", body = Vec<WebhookDeliveryResponse>),
        (status = 404, description = "No webhook", body = ErrorBody)
    ),
    tag = "Webhook"
)]
pub async fn list_deliveries(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<WebhookDeliveryResponse>>, ApiError> {
    let deliveries = state.feeds.deliveries(id, query.limit).await?;
    Ok(Json(
        deliveries
            .into_iter()
            .map(WebhookDeliveryResponse::from_domain)
            .collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feeds/:id/webhook", get(get_webhook).put(put_webhook))
        .route("/feeds/:id/webhook/test", post(test_webhook))
        .route("/feeds/:id/webhook/deliveries", get(list_deliveries))
}
