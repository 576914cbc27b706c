//! Artifact Store Port
//!
//! Opaque blob storage for generated feed files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{errors::DomainError, FeedFormat};

/// A stored feed file
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub artifact_ref: String,
    pub feed_id: Uuid,
    pub run_id: Uuid,
    pub format: FeedFormat,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist the bytes of one run, returning the artifact reference
    async fn put(
        &self,
        feed_id: Uuid,
        run_id: Uuid,
        format: FeedFormat,
        data: Vec<u8>,
    ) -> Result<String, DomainError>;

    async fn get(&self, artifact_ref: &str) -> Result<Option<StoredArtifact>, DomainError>;
}
