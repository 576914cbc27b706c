//! Dispatcher Worker - Drains the webhook outbox
//!
//! Claims due events up to the free delivery slots and runs each in its own
//! task. Wakes on the outbox signal and falls back to polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};

use crate::application::WebhookDispatcher;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Idle poll period
    pub poll: Duration,
    /// Parallel event deliveries
    pub concurrency: usize,
    /// Rows claimed per round
    pub batch_size: i64,
}

pub struct DispatcherWorker {
    dispatcher: Arc<WebhookDispatcher>,
    signal: Arc<Notify>,
    slots: Arc<Semaphore>,
    config: DispatcherConfig,
}

impl DispatcherWorker {
    pub fn new(
        dispatcher: Arc<WebhookDispatcher>,
        signal: Arc<Notify>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            dispatcher,
            signal,
            slots: Arc::new(Semaphore::new(config.concurrency.max(1))),
            config,
        }
    }

    /// Start the worker (runs in background)
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        tracing::info!(
            "📨 Webhook dispatcher started (poll: {:?}, concurrency: {})",
            self.config.poll,
            self.config.concurrency
        );

        loop {
            let capacity = (self.slots.available_permits() as i64).min(self.config.batch_size);
            if capacity == 0 {
                // Every slot busy: look again once one frees up
                if self.slots.acquire().await.is_err() {
                    break;
                }
                continue;
            }

            // A full batch means more rows may already be due
            if self.drain(capacity).await == capacity {
                continue;
            }

            tokio::select! {
                _ = self.signal.notified() => {}
                _ = tokio::time::sleep(self.config.poll) => {}
            }
        }
    }

    async fn drain(&self, capacity: i64) -> i64 {
        let events = match self.dispatcher.claim(capacity).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("⚠️  Failed to claim webhook events: {}", e);
                return 0;
            }
        };
        let claimed = events.len() as i64;

        for event in events {
            let Ok(slot) = Arc::clone(&self.slots).acquire_owned().await else {
                break;
            };
            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                dispatcher.deliver(event).await;
                drop(slot);
            });
        }
        claimed
    }
}
