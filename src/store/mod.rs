//! Repository seam between the auction core and its data store.
//!
//! Every append is a compare-and-swap on the auction's `version`: the caller
//! reads the auction, decides, then appends with the version it read. A
//! concurrent append on the same auction makes the store answer
//! `StoreError::VersionConflict`, and the caller re-reads and decides again.

// region:    --- Imports
use crate::auction::events::{NewStateEvent, StateEvent};
use crate::auction::model::{Auction, AuctionState, NewAuction, Profile, Publication};
use crate::bidding::model::{BlacklistEntry, NewOffer, Offer};
use crate::error::{AuctionError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use tracing::warn;

// endregion: --- Imports

pub mod memory;

pub use memory::InMemoryStore;

// region:    --- Auction Store Trait
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Inserts the auction together with its initial `PROPOSED` event.
    async fn create_auction(
        &self,
        new: &NewAuction,
        created_at: DateTime<Utc>,
    ) -> Result<Auction, StoreError>;

    async fn find_auction(&self, auction_id: i64) -> Result<Option<Auction>, StoreError>;

    /// State events ordered by `applied_at`, ties by insertion order.
    async fn state_events(&self, auction_id: i64) -> Result<Vec<StateEvent>, StoreError>;

    /// Appends a state event if the auction is still at `expected_version`.
    /// `publication` is written in the same transaction.
    async fn append_state(
        &self,
        expected_version: i64,
        event: NewStateEvent,
        publication: Option<Publication>,
    ) -> Result<StateEvent, StoreError>;

    /// Offers in creation order.
    async fn offers(&self, auction_id: i64) -> Result<Vec<Offer>, StoreError>;

    async fn highest_offer(&self, auction_id: i64) -> Result<Option<Offer>, StoreError>;

    async fn latest_offer_by(
        &self,
        auction_id: i64,
        bidder_id: i64,
    ) -> Result<Option<Offer>, StoreError>;

    /// Appends an offer if the auction is still at `expected_version`.
    async fn append_offer(&self, expected_version: i64, offer: NewOffer)
        -> Result<Offer, StoreError>;

    async fn is_blacklisted(&self, auction_id: i64, profile_id: i64) -> Result<bool, StoreError>;

    /// Idempotent.
    async fn add_blacklist_entry(&self, entry: &BlacklistEntry) -> Result<(), StoreError>;

    async fn category_exists(&self, category_id: i64) -> Result<bool, StoreError>;

    async fn find_profile(&self, profile_id: i64) -> Result<Option<Profile>, StoreError>;

    /// Auctions currently `PUBLISHED` whose `closes_at <= now`, excluding held ones.
    async fn find_expired_published(&self, now: DateTime<Utc>)
        -> Result<Vec<Auction>, StoreError>;

    /// Auctions whose current state is `state`, excluding held ones.
    async fn find_by_state(&self, state: AuctionState) -> Result<Vec<Auction>, StoreError>;

    async fn mark_notified(&self, auction_id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Takes the auction out of the closing sweep until an operator clears it.
    /// The first reason recorded is kept.
    async fn hold_settlement(
        &self,
        auction_id: i64,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), StoreError>;
}
// endregion: --- Auction Store Trait

// region:    --- Conflict Retry
/// Runs `attempt` until it stops hitting version conflicts, at most `max_attempts` times.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    component: &str,
    auction_id: i64,
    max_attempts: u32,
    mut attempt: F,
) -> Result<T, AuctionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AuctionError>>,
{
    let attempts = max_attempts.max(1);
    for round in 1..=attempts {
        match attempt().await {
            Err(e) if e.is_conflict() => {
                warn!(
                    "{:<12} --> version conflict on auction {}: retry {}/{}",
                    component, auction_id, round, attempts
                );
            }
            other => return other,
        }
    }
    Err(AuctionError::RetriesExhausted {
        auction_id,
        attempts,
    })
}
// endregion: --- Conflict Retry
