//! Feedgen Domain Library
//!
//! Core domain types and interfaces for the product-feed generation service.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (Product, Feed, GenerationHistory, Schedule, Webhook)
//!   - `value_objects/`: Immutable value types (Channel, FeedFormat, FilterSpec, ...)
//!   - `services/`: Filter engine, platform serializers, event payloads
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Data access interfaces
//!   - `services/`: Artifact storage
//!   - `WebhookTransport`, `Clock`
//!
//! # Usage
//!
//! ```rust,ignore
//! use feedgen::domain::{Feed, Product};
//! use feedgen::domain::services::{FilterEngine, FeedEncoder};
//! use feedgen::ports::{FeedRepository, CatalogSource};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Availability, Channel, DeliveryStatus, DomainError, Feed, FeedFormat, FeedSettings,
    FeedStatus, FeedTarget, FilterSpec, GenerationError, GenerationHistory, HistoryStatus,
    Product, QueuedEvent, RunStats, Schedule, ScheduleInterval, Transformations,
    WebhookDelivery, WebhookEventType, WebhookSubscription,
};
pub use ports::{
    ArtifactStore, AttemptOutcome, CatalogSource, Clock, FeedRepository, LockOutcome,
    ReconcileReport, ScheduleRepository, StoredArtifact, WebhookDeliveryConfig,
    WebhookRepository, WebhookTransport,
};
