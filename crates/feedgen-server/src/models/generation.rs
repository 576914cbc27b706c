//! Generation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use feedgen::GenerationHistory;

/// Records rendered by a preview when `max_products` is omitted
pub const DEFAULT_PREVIEW_PRODUCTS: usize = 100;

/// Accepted regeneration
#[derive(Debug, Serialize, ToSchema)]
pub struct RegenerateResponse {
    pub run_id: Uuid,
    pub feed_id: Uuid,
    pub status: String,
}

/// One generation run
#[derive(Debug, Serialize, ToSchema)]
pub struct RunResponse {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub status: String,
    pub products_processed: i64,
    pub products_included: i64,
    pub products_excluded: i64,
    pub generation_time_ms: i64,
    pub file_size_bytes: i64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunResponse {
    pub fn from_domain(run: GenerationHistory) -> Self {
        Self {
            id: run.id,
            feed_id: run.feed_id,
            status: run.status.to_string(),
            products_processed: run.products_processed,
            products_included: run.products_included,
            products_excluded: run.products_excluded,
            generation_time_ms: run.generation_time_ms,
            file_size_bytes: run.file_size_bytes,
            error_message: run.error_message,
            started_at: run.started_at,
            completed_at: run.completed_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    /// Maximum records to render (default 100, capped by server config)
    pub max_products: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Rows to return, newest first (default 20, max 100)
    pub limit: Option<i64>,
}

/// Scheduler tick result
#[derive(Debug, Serialize, ToSchema)]
pub struct RunScheduledResponse {
    pub dispatched: usize,
}
