//! Kafka consumer loop.
//!
//! Messages are processed strictly one at a time. An offset is stored only
//! after the message was both persisted and cached; librdkafka commits stored
//! offsets on its own timer. A failed message, including one with an empty
//! payload, is left unstored and the loop moves on, so it is redelivered after
//! a restart or rebalance.

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Message};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::KafkaSettings;
use crate::handler::IngestHandler;

/// Errors that stop the consumer from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),
}

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// Offset stored.
    Acknowledged,
    /// Offset left unstored for redelivery.
    Unacknowledged,
}

/// Build the librdkafka configuration for an order consumer.
#[must_use]
pub fn client_config(settings: &KafkaSettings) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", &settings.brokers)
        .set("group.id", &settings.group_id)
        .set("session.timeout.ms", "10000")
        .set("enable.auto.offset.store", "false")
        .set("enable.auto.commit", "true")
        .set("auto.commit.interval.ms", "5000")
        .set("auto.offset.reset", "earliest");
    config
}

/// Sequential order consumer over one topic.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    handler: IngestHandler,
    topic: String,
}

impl KafkaConsumer {
    /// Create a consumer and subscribe it to the configured topic.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Kafka` if the client cannot be created or the
    /// subscription is rejected.
    pub fn new(settings: &KafkaSettings, handler: IngestHandler) -> Result<Self, ConsumerError> {
        let consumer: StreamConsumer = client_config(settings).create()?;
        consumer.subscribe(&[settings.topic.as_str()])?;
        info!(
            brokers = %settings.brokers,
            topic = %settings.topic,
            group = %settings.group_id,
            "Subscribed to topic"
        );

        Ok(Self {
            consumer,
            handler,
            topic: settings.topic.clone(),
        })
    }

    /// Consume until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between messages; a message already being
    /// handled runs to completion. Receive errors are logged and the loop
    /// continues.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(topic = %self.topic, "Consumer started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                received = self.consumer.recv() => match received {
                    Ok(message) => {
                        let span = info_span!(
                            "message",
                            partition = message.partition(),
                            offset = message.offset(),
                        );
                        let disposition = self.process(&message).instrument(span.clone()).await;
                        if disposition == Disposition::Unacknowledged {
                            span.in_scope(|| debug!("Message left for redelivery"));
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to receive message"),
                },
            }
        }

        // Dropping the StreamConsumer closes the broker connection
        info!(topic = %self.topic, "Consumer stopped");
    }

    async fn process(&self, message: &BorrowedMessage<'_>) -> Disposition {
        let disposition = ingest(&self.handler, message.payload()).await;

        if disposition == Disposition::Acknowledged {
            match self.consumer.store_offset_from_message(message) {
                Ok(()) => debug!("Offset stored"),
                Err(e) => {
                    warn!(error = %e, "Failed to store offset");
                    return Disposition::Unacknowledged;
                }
            }
        }
        disposition
    }
}

/// Run one payload through the handler and decide whether its offset may be
/// stored. A missing payload is handled as an empty one, which fails to decode.
async fn ingest(handler: &IngestHandler, payload: Option<&[u8]>) -> Disposition {
    match handler.handle(payload.unwrap_or_default()).await {
        Ok(_) => Disposition::Acknowledged,
        Err(e) => {
            error!(error = %e, permanent = e.is_permanent(), "Failed to ingest message");
            Disposition::Unacknowledged
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use orderflow_core::OrderUid;
    use orderflow_core::fixtures::sample_order;
    use orderflow_storage::memory::{MemoryOrderCache, MemoryOrderStore};
    use orderflow_storage::{OrderCache, OrderStore};

    use super::*;

    fn handler() -> (IngestHandler, Arc<MemoryOrderStore>, Arc<MemoryOrderCache>) {
        let store = Arc::new(MemoryOrderStore::new());
        let cache = Arc::new(MemoryOrderCache::new());
        (IngestHandler::new(store.clone(), cache.clone()), store, cache)
    }

    fn settings() -> KafkaSettings {
        KafkaSettings {
            brokers: "kafka-1:9092,kafka-2:9092".to_string(),
            topic: "orders".to_string(),
            group_id: "orderflow".to_string(),
        }
    }

    #[test]
    fn test_client_config_disables_auto_offset_store() {
        let config = client_config(&settings());
        assert_eq!(config.get("enable.auto.offset.store"), Some("false"));
        assert_eq!(config.get("enable.auto.commit"), Some("true"));
        assert_eq!(config.get("auto.commit.interval.ms"), Some("5000"));
    }

    #[test]
    fn test_client_config_connection_settings() {
        let config = client_config(&settings());
        assert_eq!(config.get("bootstrap.servers"), Some("kafka-1:9092,kafka-2:9092"));
        assert_eq!(config.get("group.id"), Some("orderflow"));
        assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
        assert_eq!(config.get("session.timeout.ms"), Some("10000"));
    }

    #[tokio::test]
    async fn test_ingest_success_acknowledges() {
        let (handler, store, cache) = handler();
        let payload = sample_order("A1").to_json().unwrap();

        let disposition = ingest(&handler, Some(payload.as_bytes())).await;

        assert_eq!(disposition, Disposition::Acknowledged);
        let uid = OrderUid::new("A1");
        assert!(store.get_by_id(&uid).await.unwrap().is_some());
        assert!(cache.get(&uid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ingest_redelivery_acknowledges() {
        let (handler, store, _cache) = handler();
        let payload = sample_order("A1").to_json().unwrap();

        ingest(&handler, Some(payload.as_bytes())).await;
        let disposition = ingest(&handler, Some(payload.as_bytes())).await;

        assert_eq!(disposition, Disposition::Acknowledged);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_store_failure_is_unacknowledged() {
        let (handler, store, cache) = handler();
        store.set_unavailable(true);
        let payload = sample_order("A1").to_json().unwrap();

        let disposition = ingest(&handler, Some(payload.as_bytes())).await;

        assert_eq!(disposition, Disposition::Unacknowledged);
        assert_eq!(cache.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_ingest_cache_failure_is_unacknowledged() {
        let (handler, store, cache) = handler();
        cache.set_unavailable(true);
        let payload = sample_order("A1").to_json().unwrap();

        let disposition = ingest(&handler, Some(payload.as_bytes())).await;

        assert_eq!(disposition, Disposition::Unacknowledged);
        // Persisted already; redelivery re-runs the idempotent save
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_malformed_payload_is_unacknowledged() {
        let (handler, store, _cache) = handler();

        let disposition = ingest(&handler, Some(b"{not json".as_slice())).await;

        assert_eq!(disposition, Disposition::Unacknowledged);
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_ingest_empty_payload_is_unacknowledged() {
        let (handler, store, cache) = handler();

        assert_eq!(ingest(&handler, None).await, Disposition::Unacknowledged);
        assert_eq!(
            ingest(&handler, Some(b"".as_slice())).await,
            Disposition::Unacknowledged
        );
        assert_eq!(store.save_calls(), 0);
        assert_eq!(cache.set_calls(), 0);
    }
}
