// region:    --- Imports
use super::{Notifier, SaleSummary};
use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

// endregion: --- Imports

/// POSTs the sale summary as JSON to an external notification service.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_sale(&self, sale: &SaleSummary) -> Result<(), NotifyError> {
        debug!(
            "{:<12} --> webhook for auction {}: {}",
            "Notifier", sale.auction_id, self.url
        );
        self.client
            .post(&self.url)
            .json(sale)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}
