//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - Product: read-only catalog item supplied by upstream connectors
//! - Feed: declarative generation unit for one channel
//! - GenerationHistory: immutable record of one generation run
//! - Schedule: per-feed automation config
//! - WebhookSubscription / QueuedEvent / WebhookDelivery: outbound notifications

mod feed;
mod history;
mod product;
mod schedule;
mod webhook;

pub use feed::*;
pub use history::*;
pub use product::*;
pub use schedule::*;
pub use webhook::*;
