//! PostgreSQL Repository Implementations

mod artifact_store;
mod catalog_source;
mod feed_repository;
mod schedule_repository;
mod webhook_repository;

pub use artifact_store::PgArtifactStore;
pub use catalog_source::PgCatalogSource;
pub use feed_repository::PgFeedRepository;
pub use schedule_repository::PgScheduleRepository;
pub use webhook_repository::PgWebhookRepository;

use feedgen::DomainError;

fn db_err(e: sqlx::Error) -> DomainError {
    DomainError::Repository(e.to_string())
}

/// Text column holding an enum written by this crate
fn parse_column<T>(column: &str, raw: &str) -> Result<T, DomainError>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse()
        .map_err(|e: String| DomainError::Repository(format!("Corrupt {} column: {}", column, e)))
}
