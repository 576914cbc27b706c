use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use feedgen::WebhookRepository;

mod adapters;
mod application;
mod auth;
mod config;
mod models;
mod routes;
mod services;

use adapters::{
    HttpWebhook, PgArtifactStore, PgCatalogSource, PgFeedRepository, PgScheduleRepository,
    PgWebhookRepository, SystemClock,
};
use application::{
    FeedService, GenerationService, SchedulerService, WebhookDefaults, WebhookDispatcher,
};
use config::AppConfig;
use services::dispatcher::{DispatcherConfig, DispatcherWorker};
use services::scheduler;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub feeds: Arc<FeedService>,
    pub generation: Arc<GenerationService>,
    pub scheduler: Arc<SchedulerService>,
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Feedgen API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    tracing::info!("🛒 Feedgen API initializing...");

    let config = AppConfig::load(&secrets);

    if let Some(api_key) = config.api_key.clone() {
        auth::init_api_key(api_key);
        tracing::info!("🔐 API key authentication enabled");
    } else {
        tracing::warn!("⚠️  No FEEDGEN_API_KEY set - authentication disabled");
    }

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("✅ Database migrations completed");

    // Adapters
    let feed_repo = Arc::new(PgFeedRepository::new(pool.clone()));
    let schedule_repo = Arc::new(PgScheduleRepository::new(pool.clone()));
    let webhook_repo = Arc::new(PgWebhookRepository::new(pool.clone()));
    let catalog = Arc::new(PgCatalogSource::new(pool.clone()));
    let artifacts = Arc::new(PgArtifactStore::new(pool.clone()));
    let clock = Arc::new(SystemClock);
    let http_webhook = Arc::new(HttpWebhook::new());
    let outbox_signal = Arc::new(Notify::new());

    // Application services
    let generation = Arc::new(GenerationService::new(
        feed_repo.clone(),
        catalog,
        artifacts.clone(),
        clock.clone(),
        outbox_signal.clone(),
        config.pipeline_deadline,
        config.preview_max_products,
    ));
    let scheduler_service = Arc::new(SchedulerService::new(
        schedule_repo.clone(),
        generation.clone(),
        clock.clone(),
        config.max_concurrent_runs,
    ));
    let feeds = Arc::new(FeedService::new(
        feed_repo,
        schedule_repo,
        webhook_repo.clone(),
        artifacts,
        clock.clone(),
        outbox_signal.clone(),
        WebhookDefaults {
            retry_count: config.webhook_default_retries,
            timeout_seconds: config.webhook_default_timeout_s,
        },
    ));
    let dispatcher = Arc::new(WebhookDispatcher::new(
        webhook_repo.clone(),
        http_webhook,
        clock,
        config.webhook_retry_base,
    ));

    // Recover state left behind by a previous process
    if let Err(e) = generation.reconcile().await {
        tracing::error!("🚨 Failed to reconcile abandoned runs: {}", e);
    }
    match webhook_repo.release_in_flight().await {
        Ok(0) => {}
        Ok(n) => tracing::warn!("⚠️  Released {} in-flight webhook event(s)", n),
        Err(e) => tracing::error!("🚨 Failed to release in-flight webhook events: {}", e),
    }

    // Background workers
    DispatcherWorker::new(
        dispatcher,
        outbox_signal,
        DispatcherConfig {
            poll: config.dispatcher_poll,
            concurrency: config.dispatcher_concurrency,
            batch_size: config.dispatcher_batch_size,
        },
    )
    .start();
    tracing::info!("🔔 Webhook dispatcher initialized");

    if let Some(_handle) =
        scheduler::maybe_start_scheduler(scheduler_service.clone(), config.scheduler_tick)
    {
        tracing::info!("📅 Feed scheduler started");
    } else {
        tracing::warn!("⚠️  Internal scheduler disabled - rely on POST /feeds/run-scheduled");
    }

    let state = AppState {
        feeds,
        generation,
        scheduler: scheduler_service,
    };

    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .merge(routes::feed::router())
        .merge(routes::generation::router())
        .merge(routes::schedule::router())
        .merge(routes::webhook::router())
        .layer(middleware::from_fn(auth::auth_middleware));

    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Feedgen API ready");

    Ok(router.into())
}
