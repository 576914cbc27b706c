//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations and coordinates between
//! repositories, the artifact store and the webhook transport.

mod feed_service;
mod generation_service;
mod scheduler_service;
mod webhook_dispatcher;

pub use feed_service::{FeedService, FeedUpdate, WebhookDefaults, WebhookUpdate};
pub use generation_service::GenerationService;
pub use scheduler_service::SchedulerService;
pub use webhook_dispatcher::WebhookDispatcher;
