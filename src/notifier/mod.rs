//! Sale notification seam used by the closing sweep.

// region:    --- Imports
use crate::auction::model::Profile;
use crate::error::NotifyError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

pub mod kafka;
pub mod webhook;

pub use kafka::KafkaSaleNotifier;
pub use webhook::WebhookNotifier;

// region:    --- Sale Summary
/// Everything a notifier needs to tell the auctioneer and the winner about a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleSummary {
    pub auction_id: i64,
    pub title: String,
    pub seller: Profile,
    pub winner: Profile,
    pub amount: i64,
    pub sold_at: DateTime<Utc>,
}
// endregion: --- Sale Summary

// region:    --- Notifier Trait
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_sale(&self, sale: &SaleSummary) -> Result<(), NotifyError>;
}

/// Writes the sale to the log. Default when no transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_sale(&self, sale: &SaleSummary) -> Result<(), NotifyError> {
        info!(
            "{:<12} --> auction {} '{}' sold for {}: seller {} <{}>, winner {} <{}>",
            "Notifier",
            sale.auction_id,
            sale.title,
            sale.amount,
            sale.seller.name,
            sale.seller.email,
            sale.winner.name,
            sale.winner.email
        );
        Ok(())
    }
}
// endregion: --- Notifier Trait
