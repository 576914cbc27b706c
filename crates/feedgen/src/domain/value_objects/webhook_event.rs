//! WebhookEventType - Events a subscription can receive

use serde::{Deserialize, Serialize};

/// Feed lifecycle events announced to webhook subscribers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WebhookEventType {
    #[serde(rename = "feed.generated")]
    FeedGenerated,
    #[serde(rename = "feed.failed")]
    FeedFailed,
    /// Endpoint verification event; emitted only by the webhook test trigger
    #[serde(rename = "feed.validated")]
    FeedValidated,
}

impl WebhookEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeedGenerated => "feed.generated",
            Self::FeedFailed => "feed.failed",
            Self::FeedValidated => "feed.validated",
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WebhookEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed.generated" => Ok(Self::FeedGenerated),
            "feed.failed" => Ok(Self::FeedFailed),
            "feed.validated" => Ok(Self::FeedValidated),
            _ => Err(format!("Unknown webhook event: {}", s)),
        }
    }
}
