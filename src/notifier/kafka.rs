// region:    --- Imports
use super::{Notifier, SaleSummary};
use crate::error::NotifyError;
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use std::sync::Arc;

// endregion: --- Imports

/// Publishes sales to a Kafka topic, keyed by auction id.
pub struct KafkaSaleNotifier {
    producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaSaleNotifier {
    pub fn new(producer: Arc<KafkaProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for KafkaSaleNotifier {
    async fn notify_sale(&self, sale: &SaleSummary) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(sale)?;
        self.producer
            .send_message(&self.topic, &sale.auction_id.to_string(), &payload)
            .await
            .map_err(NotifyError::Transport)
    }
}
