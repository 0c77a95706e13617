// region:    --- Imports
use crate::auction::events::StateEvent;
use crate::auction::model::{Auction, AuctionState};
use crate::bidding::model::Offer;
use crate::error::StoreError;
use crate::state_log;
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Views
/// Auction with its derived status and current price.
#[derive(Debug, Clone, Serialize)]
pub struct AuctionView {
    #[serde(flatten)]
    pub auction: Auction,
    pub state: Option<AuctionState>,
    pub closes_at: Option<DateTime<Utc>>,
    pub highest_offer: Option<Offer>,
}
// endregion: --- Views

// region:    --- Query Handlers

/// Auction detail
pub async fn get_auction_view(
    store: &dyn AuctionStore,
    auction_id: i64,
) -> Result<Option<AuctionView>, StoreError> {
    info!("{:<12} --> auction view id: {}", "Query", auction_id);
    let Some(auction) = store.find_auction(auction_id).await? else {
        return Ok(None);
    };
    let events = store.state_events(auction_id).await?;
    let highest_offer = store.highest_offer(auction_id).await?;
    let closes_at = auction
        .closes_at()
        .map_err(|e| StoreError::Integrity(e.to_string()))?;
    Ok(Some(AuctionView {
        state: state_log::latest(&events).map(|e| e.state),
        closes_at,
        auction,
        highest_offer,
    }))
}

/// Offer history, oldest first
pub async fn get_offer_history(
    store: &dyn AuctionStore,
    auction_id: i64,
) -> Result<Vec<Offer>, StoreError> {
    info!("{:<12} --> offer history id: {}", "Query", auction_id);
    store.offers(auction_id).await
}

/// State history, oldest first
pub async fn get_state_history(
    store: &dyn AuctionStore,
    auction_id: i64,
) -> Result<Vec<StateEvent>, StoreError> {
    info!("{:<12} --> state history id: {}", "Query", auction_id);
    store.state_events(auction_id).await
}

// endregion: --- Query Handlers
