//! Webhook Event Payloads
//!
//! Bodies are built once, at enqueue time, and delivered byte-for-byte. Field
//! order is fixed by struct declaration order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{Feed, RunStats};
use crate::domain::value_objects::{Channel, FeedFormat, WebhookEventType};

#[derive(Serialize)]
struct GeneratedBody<'a> {
    event: &'static str,
    feed_id: Uuid,
    feed_name: &'a str,
    channel: Channel,
    format: FeedFormat,
    products_included: i64,
    products_excluded: i64,
    generation_time_ms: i64,
    file_size_bytes: i64,
    timestamp: String,
}

#[derive(Serialize)]
struct FailedBody<'a> {
    event: &'static str,
    feed_id: Uuid,
    feed_name: &'a str,
    channel: Channel,
    format: FeedFormat,
    error_message: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct ValidatedBody<'a> {
    event: &'static str,
    feed_id: Uuid,
    feed_name: &'a str,
    channel: Channel,
    format: FeedFormat,
    timestamp: String,
}

/// A serialized event ready to be fanned out to subscriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub event: WebhookEventType,
    pub feed_id: Uuid,
    pub payload: Vec<u8>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn encode<T: Serialize>(body: &T) -> Vec<u8> {
    // Plain structs of strings and integers cannot fail to encode
    serde_json::to_vec(body).expect("event body serializes")
}

impl FeedEvent {
    pub fn generated(feed: &Feed, stats: &RunStats, at: DateTime<Utc>) -> Self {
        let event = WebhookEventType::FeedGenerated;
        let payload = encode(&GeneratedBody {
            event: event.as_str(),
            feed_id: feed.id,
            feed_name: &feed.name,
            channel: feed.channel,
            format: feed.format,
            products_included: stats.products_included,
            products_excluded: stats.products_excluded,
            generation_time_ms: stats.generation_time_ms,
            file_size_bytes: stats.file_size_bytes,
            timestamp: timestamp(at),
        });
        Self { event, feed_id: feed.id, payload }
    }

    pub fn failed(feed: &Feed, error_message: &str, at: DateTime<Utc>) -> Self {
        let event = WebhookEventType::FeedFailed;
        let payload = encode(&FailedBody {
            event: event.as_str(),
            feed_id: feed.id,
            feed_name: &feed.name,
            channel: feed.channel,
            format: feed.format,
            error_message,
            timestamp: timestamp(at),
        });
        Self { event, feed_id: feed.id, payload }
    }

    pub fn validated(feed: &Feed, at: DateTime<Utc>) -> Self {
        let event = WebhookEventType::FeedValidated;
        let payload = encode(&ValidatedBody {
            event: event.as_str(),
            feed_id: feed.id,
            feed_name: &feed.name,
            channel: feed.channel,
            format: feed.format,
            timestamp: timestamp(at),
        });
        Self { event, feed_id: feed.id, payload }
    }
}
