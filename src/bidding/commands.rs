/// Bid commands
/// 1. Place bid
/// 2. Block bidder (auctioneer only)
// region:    --- Imports
use super::model::{BlacklistEntry, NewOffer, Offer};
use super::rules;
use crate::auction::model::AuctionState;
use crate::clock::Clock;
use crate::error::{AuctionError, Outcome, ResultCode};
use crate::state_log::StateLog;
use crate::store::{retry_on_conflict, AuctionStore};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
/// Place bid command
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
}

/// Block bidder command
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct BlockBidderCommand {
    pub auction_id: i64,
    pub requester_id: i64,
    pub profile_id: i64,
}
// endregion: --- Commands

// region:    --- Bid Validator
/// Admits or rejects offers. The only writer of offers.
pub struct BidValidator {
    store: Arc<dyn AuctionStore>,
    state_log: StateLog,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    max_retries: u32,
}

impl BidValidator {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            state_log: StateLog::new(Arc::clone(&store)),
            store,
            clock,
            cooldown,
            max_retries,
        }
    }

    /// 1. Place bid
    ///
    /// Every check runs against one read of the auction; the append only
    /// succeeds if no other append touched the auction since that read.
    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> Result<Outcome<Offer>, AuctionError> {
        info!("{:<12} --> place bid: {:?}", "Bid", cmd);
        let outcome = retry_on_conflict("Bid", cmd.auction_id, self.max_retries, || {
            self.try_place_bid(cmd)
        })
        .await?;

        match &outcome {
            Outcome::Accepted(offer) => info!(
                "{:<12} --> offer {} accepted on auction {}: {}",
                "Bid", offer.id, offer.auction_id, offer.amount
            ),
            Outcome::Rejected(code) => info!(
                "{:<12} --> bid on auction {} by {} rejected: {:?}",
                "Bid", cmd.auction_id, cmd.bidder_id, code
            ),
        }
        Ok(outcome)
    }

    async fn try_place_bid(&self, cmd: PlaceBidCommand) -> Result<Outcome<Offer>, AuctionError> {
        let Some(auction) = self.store.find_auction(cmd.auction_id).await? else {
            return Ok(ResultCode::AuctionNotFound.into());
        };
        if cmd.bidder_id == auction.owner_id {
            return Ok(ResultCode::AuctionOwner.into());
        }
        if self.store.find_profile(cmd.bidder_id).await?.is_none() {
            return Ok(ResultCode::ProfileNotFound.into());
        }

        let now = self.clock.now();
        let state = self.state_log.require_state(auction.id).await?;
        if state != AuctionState::Published || auction.is_expired(now)? {
            return Ok(ResultCode::AuctionFinished.into());
        }
        if self.store.is_blacklisted(auction.id, cmd.bidder_id).await? {
            return Ok(ResultCode::AuctionBlocked.into());
        }

        let own_last = self.store.latest_offer_by(auction.id, cmd.bidder_id).await?;
        if let Err(code) =
            rules::check_cooldown(own_last.map(|o| o.creation_date), now, self.cooldown)
        {
            return Ok(code.into());
        }

        let top = self.store.highest_offer(auction.id).await?;
        if let Err(code) = rules::check_amount(
            auction.base_price,
            auction.increment(),
            top.map(|o| o.amount),
            cmd.amount,
        ) {
            return Ok(code.into());
        }

        let offer = NewOffer {
            auction_id: auction.id,
            bidder_id: cmd.bidder_id,
            amount: cmd.amount,
            creation_date: now,
        };
        let offer = self.store.append_offer(auction.version, offer).await?;
        Ok(Outcome::Accepted(offer))
    }

    /// 2. Block bidder
    ///
    /// Bars a profile from one auction. Blocking twice is a no-op.
    pub async fn block_bidder(
        &self,
        cmd: BlockBidderCommand,
    ) -> Result<Outcome<BlacklistEntry>, AuctionError> {
        info!("{:<12} --> block bidder: {:?}", "Bid", cmd);
        let Some(auction) = self.store.find_auction(cmd.auction_id).await? else {
            return Ok(ResultCode::AuctionNotFound.into());
        };
        if cmd.requester_id != auction.owner_id {
            return Ok(ResultCode::NotAuctionOwner.into());
        }
        if cmd.profile_id == auction.owner_id {
            return Ok(ResultCode::AuctionOwner.into());
        }
        if self.store.find_profile(cmd.profile_id).await?.is_none() {
            return Ok(ResultCode::ProfileNotFound.into());
        }

        let entry = BlacklistEntry {
            auction_id: auction.id,
            profile_id: cmd.profile_id,
            creation_date: self.clock.now(),
        };
        self.store.add_blacklist_entry(&entry).await?;
        Ok(Outcome::Accepted(entry))
    }
}
// endregion: --- Bid Validator
