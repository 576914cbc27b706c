//! Webhook Dispatcher (Use Case)
//!
//! Delivers claimed outbox events. Every attempt is journaled and
//! checkpointed before the next one, so a restart resumes from the stored
//! attempt count instead of starting over.

use std::sync::Arc;
use std::time::Duration;

use feedgen::{
    Clock, DeliveryStatus, DomainError, QueuedEvent, WebhookDelivery, WebhookRepository,
    WebhookSubscription, WebhookTransport,
};

pub struct WebhookDispatcher {
    webhooks: Arc<dyn WebhookRepository>,
    transport: Arc<dyn WebhookTransport>,
    clock: Arc<dyn Clock>,
    retry_base: Duration,
}

impl WebhookDispatcher {
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        transport: Arc<dyn WebhookTransport>,
        clock: Arc<dyn Clock>,
        retry_base: Duration,
    ) -> Self {
        Self {
            webhooks,
            transport,
            clock,
            retry_base,
        }
    }

    /// Move up to `limit` due events to in-flight
    pub async fn claim(&self, limit: i64) -> Result<Vec<QueuedEvent>, DomainError> {
        self.webhooks.claim_due(self.clock.now(), limit).await
    }

    /// Run one claimed event to a terminal status.
    ///
    /// On a storage error the event stays in-flight and is released by the
    /// next startup reconciliation.
    pub async fn deliver(&self, event: QueuedEvent) -> Option<DeliveryStatus> {
        match self.run_attempts(&event).await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::error!(
                    "🚨 Webhook event {} for feed {} stalled: {}",
                    event.id,
                    event.feed_id,
                    e
                );
                None
            }
        }
    }

    async fn run_attempts(&self, event: &QueuedEvent) -> Result<DeliveryStatus, DomainError> {
        let subscription = match self.webhooks.find_by_id(event.subscription_id).await? {
            Some(sub) if sub.should_receive(event.event) => sub,
            _ => {
                tracing::debug!(
                    "Dropping {} for feed {}: subscription gone, disabled or unsubscribed",
                    event.event,
                    event.feed_id
                );
                self.webhooks.finish(event, DeliveryStatus::Dropped).await?;
                return Ok(DeliveryStatus::Dropped);
            }
        };

        let max_attempts = subscription.retry_count.max(1);
        let mut attempt = event.attempts;

        loop {
            if attempt >= max_attempts {
                self.webhooks.finish(event, DeliveryStatus::Failed).await?;
                tracing::warn!(
                    "❌ Webhook {} for feed {} failed after {} attempt(s)",
                    event.event,
                    event.feed_id,
                    attempt
                );
                return Ok(DeliveryStatus::Failed);
            }
            attempt += 1;

            let delivery = self.attempt(&subscription, event, attempt).await;
            let backoff = WebhookSubscription::retry_delay(attempt, self.retry_base);
            let next_attempt_at = delivery.delivered_at
                + chrono::Duration::from_std(backoff).unwrap_or_else(|_| chrono::Duration::zero());
            self.webhooks.record_attempt(&delivery, next_attempt_at).await?;

            if delivery.success {
                self.webhooks.finish(event, DeliveryStatus::Delivered).await?;
                tracing::info!(
                    "📨 Webhook {} delivered for feed {} (attempt {})",
                    event.event,
                    event.feed_id,
                    attempt
                );
                return Ok(DeliveryStatus::Delivered);
            }

            if attempt < max_attempts {
                tracing::debug!(
                    "Webhook attempt {}/{} for event {} failed ({}), retrying in {:?}",
                    attempt,
                    max_attempts,
                    event.id,
                    delivery.error_message.as_deref().unwrap_or("unknown"),
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }

    async fn attempt(
        &self,
        subscription: &WebhookSubscription,
        event: &QueuedEvent,
        attempt: i32,
    ) -> WebhookDelivery {
        let outcome = self
            .transport
            .send(subscription, event.event, &event.payload)
            .await;
        WebhookDelivery::attempt(
            event,
            attempt,
            outcome.status_code,
            outcome.response_time_ms,
            outcome.error,
            self.clock.now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryStore, ScriptedTransport, TokioClock};
    use chrono::{DateTime, Utc};
    use feedgen::WebhookEventType;
    use uuid::Uuid;

    struct Harness {
        store: Arc<MemoryStore>,
        transport: Arc<ScriptedTransport>,
        dispatcher: WebhookDispatcher,
    }

    fn harness(replies: Vec<Option<i32>>) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::replying(replies));
        let dispatcher = WebhookDispatcher::new(
            store.clone(),
            transport.clone(),
            Arc::new(TokioClock::new()),
            Duration::from_secs(1),
        );
        Harness {
            store,
            transport,
            dispatcher,
        }
    }

    impl Harness {
        fn subscribe(&self, retry_count: i32) -> WebhookSubscription {
            let sub = WebhookSubscription::new(
                Uuid::new_v4(),
                "https://hooks.example/feed".into(),
                retry_count,
                30,
            );
            self.store.put_subscription(sub.clone());
            sub
        }

        async fn queue(&self, sub: &WebhookSubscription, attempts: i32) -> QueuedEvent {
            let event = QueuedEvent {
                id: Uuid::new_v4(),
                subscription_id: sub.id,
                feed_id: sub.feed_id,
                event: WebhookEventType::FeedGenerated,
                payload: br#"{"event":"feed.generated"}"#.to_vec(),
                attempts,
                next_attempt_at: DateTime::<Utc>::UNIX_EPOCH,
                created_at: Utc::now(),
            };
            WebhookRepository::enqueue(self.store.as_ref(), &event).await.unwrap();
            let mut claimed = self.dispatcher.claim(10).await.unwrap();
            assert_eq!(claimed.len(), 1);
            claimed.remove(0)
        }

        fn status_of(&self, event: &QueuedEvent) -> DeliveryStatus {
            self.store
                .outbox()
                .into_iter()
                .find(|(e, _)| e.id == event.id)
                .map(|(_, status)| status)
                .unwrap()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_exponential_backoff_then_succeeds() {
        let h = harness(vec![Some(500), Some(500), Some(200)]);
        let sub = h.subscribe(3);
        let event = h.queue(&sub, 0).await;

        let status = h.dispatcher.deliver(event.clone()).await;
        assert_eq!(status, Some(DeliveryStatus::Delivered));

        let journal = h.store.deliveries();
        assert_eq!(journal.len(), 3);
        assert_eq!(
            journal.iter().map(|d| d.attempt).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            journal.iter().map(|d| d.success).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(journal[0].status_code, Some(500));
        assert_eq!(journal[0].error_message.as_deref(), Some("HTTP 500"));

        let gap1 = journal[1].delivered_at - journal[0].delivered_at;
        let gap2 = journal[2].delivered_at - journal[1].delivered_at;
        assert!(gap1 >= chrono::Duration::seconds(1));
        assert!(gap2 >= chrono::Duration::seconds(2));

        let calls = h.transport.call_times();
        assert!(calls[1] - calls[0] >= Duration::from_secs(1));
        assert!(calls[2] - calls[1] >= Duration::from_secs(2));

        let sub = h.store.subscription(sub.id).unwrap();
        assert_eq!(sub.total_deliveries, 1);
        assert_eq!(sub.successful_deliveries, 1);
        assert_eq!(sub.failed_deliveries, 0);
        assert_eq!(h.status_of(&event), DeliveryStatus::Delivered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_event() {
        let h = harness(vec![Some(503), None, Some(500)]);
        let sub = h.subscribe(3);
        let event = h.queue(&sub, 0).await;

        assert_eq!(h.dispatcher.deliver(event.clone()).await, Some(DeliveryStatus::Failed));
        assert_eq!(h.transport.call_count(), 3);

        let journal = h.store.deliveries();
        assert_eq!(journal.len(), 3);
        assert!(journal.iter().all(|d| !d.success));
        assert_eq!(journal[1].status_code, None);
        assert_eq!(journal[1].error_message.as_deref(), Some("connection refused"));

        let sub = h.store.subscription(sub.id).unwrap();
        assert_eq!(sub.failed_deliveries, 1);
        assert_eq!(
            sub.total_deliveries,
            sub.successful_deliveries + sub.failed_deliveries
        );
        assert_eq!(h.status_of(&event), DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_disabled_subscription_drops_event() {
        let h = harness(vec![]);
        let mut sub = h.subscribe(3);
        let event = h.queue(&sub, 0).await;
        sub.enabled = false;
        h.store.put_subscription(sub.clone());

        assert_eq!(h.dispatcher.deliver(event.clone()).await, Some(DeliveryStatus::Dropped));
        assert_eq!(h.transport.call_count(), 0);
        assert!(h.store.deliveries().is_empty());

        let sub = h.store.subscription(sub.id).unwrap();
        assert_eq!(sub.total_deliveries, 0);
        assert_eq!(h.status_of(&event), DeliveryStatus::Dropped);
    }

    #[tokio::test]
    async fn test_unsubscribed_event_type_is_dropped() {
        let h = harness(vec![]);
        let sub = h.subscribe(3);
        let mut event = h.queue(&sub, 0).await;
        event.event = WebhookEventType::FeedValidated;

        assert_eq!(h.dispatcher.deliver(event).await, Some(DeliveryStatus::Dropped));
        assert_eq!(h.transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resumes_from_checkpointed_attempts() {
        let h = harness(vec![Some(500)]);
        let sub = h.subscribe(3);
        let event = h.queue(&sub, 2).await;

        assert_eq!(h.dispatcher.deliver(event).await, Some(DeliveryStatus::Failed));
        assert_eq!(h.transport.call_count(), 1);
        assert_eq!(h.store.deliveries()[0].attempt, 3);
    }

    #[tokio::test]
    async fn test_released_in_flight_event_is_claimed_again() {
        let h = harness(vec![]);
        let sub = h.subscribe(3);
        let event = h.queue(&sub, 0).await;
        assert_eq!(h.status_of(&event), DeliveryStatus::InFlight);
        assert!(h.dispatcher.claim(10).await.unwrap().is_empty());

        let released = WebhookRepository::release_in_flight(h.store.as_ref()).await.unwrap();
        assert_eq!(released, 1);

        let reclaimed = h.dispatcher.claim(10).await.unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, event.id);
        assert_eq!(
            h.dispatcher.deliver(reclaimed[0].clone()).await,
            Some(DeliveryStatus::Delivered)
        );
    }
}
