//! Domain Errors
//!
//! Error types for domain operations and the generation pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: Uuid) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    pub fn not_found_str<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }
}

/// Failure taxonomy of a generation run.
///
/// Only `Config`, `NotFound` and `ConcurrentGenerationInProgress` reach a
/// synchronous caller; everything else is recorded on the history row and
/// announced through a `feed.failed` event.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid feed configuration: {0}")]
    Config(String),

    #[error("Feed {0} already has a generation in progress")]
    ConcurrentGenerationInProgress(Uuid),

    #[error("Feed {0} not found")]
    NotFound(Uuid),

    #[error("Catalog read failed: {0}")]
    Source(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Storage failed: {0}")]
    Storage(String),

    #[error("Generation exceeded deadline of {0} seconds")]
    Timeout(u64),
}

impl GenerationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::ConcurrentGenerationInProgress(_) => "generation_in_progress",
            Self::NotFound(_) => "not_found",
            Self::Source(_) => "source_error",
            Self::Serialization(_) => "serialization_error",
            Self::Storage(_) => "storage_error",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Errors surfaced to the caller before any history row exists
    pub fn is_synchronous(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ConcurrentGenerationInProgress(_) | Self::NotFound(_)
        )
    }
}

impl From<crate::domain::services::SerializeError> for GenerationError {
    fn from(err: crate::domain::services::SerializeError) -> Self {
        Self::Serialization(err.to_string())
    }
}
