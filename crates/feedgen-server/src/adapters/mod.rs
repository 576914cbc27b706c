//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod clock;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod webhook;

// Re-exports
pub use clock::SystemClock;
pub use postgres::{
    PgArtifactStore, PgCatalogSource, PgFeedRepository, PgScheduleRepository, PgWebhookRepository,
};
pub use webhook::HttpWebhook;
