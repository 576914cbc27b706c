//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use super::error::ErrorBody;
use crate::models::{
    // Feed models
    CreateFeedRequest,
    FeedResponse,
    // Schedule models
    PutScheduleRequest,
    // Webhook models
    PutWebhookRequest,
    // Generation models
    RegenerateResponse,
    RunResponse,
    RunScheduledResponse,
    ScheduleResponse,
    UpdateFeedRequest,
    WebhookDeliveryResponse,
    WebhookResponse,
    WebhookTestResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Feed endpoints
        super::feed::create_feed,
        super::feed::get_feed,
        super::feed::update_feed,
        super::feed::download_feed,
        super::feed::feed_history,
        super::feed::get_run,
        // Generation endpoints
        super::generation::regenerate_feed,
        super::generation::preview_feed,
        super::generation::run_scheduled,
        // Schedule endpoints
        super::schedule::get_schedule,
        super::schedule::put_schedule,
        // Webhook endpoints
        super::webhook::get_webhook,
        super::webhook::put_webhook,
        super::webhook::test_webhook,
        super::webhook::list_deliveries,
    ),
    components(schemas(
        ErrorBody,
        CreateFeedRequest,
        UpdateFeedRequest,
        FeedResponse,
        RegenerateResponse,
        RunResponse,
        RunScheduledResponse,
        PutScheduleRequest,
        ScheduleResponse,
        PutWebhookRequest,
        WebhookResponse,
        WebhookDeliveryResponse,
        WebhookTestResponse,
    )),
    tags(
        (name = "Feed", description = "Feed configuration, history and downloads"),
        (name = "Generation", description = "Manual runs, previews and scheduler ticks"),
        (name = "Schedule", description = "Per-feed automation"),
        (name = "Webhook", description = "Feed event notifications"),
    ),
    info(
        title = "Feedgen API",
        version = "0.1.0",
        description = "Product feed generation: filter a tenant catalog and publish Google, Facebook and Instagram feeds"
    )
)]
pub struct ApiDoc;
