//! Moderation and settlement transitions.
//! 1. propose / publish / reject (moderation, business outcomes as result codes)
//! 2. close / concretize / finish (settlement, idempotent past their guard)
// region:    --- Imports
use crate::auction::events::{NewStateEvent, StateEvent};
use crate::auction::model::{Auction, AuctionState, NewAuction, Publication};
use crate::clock::Clock;
use crate::error::{AuctionError, Outcome, ResultCode};
use crate::state_log::StateLog;
use crate::store::{retry_on_conflict, AuctionStore};
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

/// Result of a settlement transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(StateEvent),
    /// The auction was already at or past the target; nothing was written.
    Skipped(AuctionState),
}

// region:    --- Lifecycle Manager
pub struct LifecycleManager {
    store: Arc<dyn AuctionStore>,
    state_log: StateLog,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>, max_retries: u32) -> Self {
        Self {
            state_log: StateLog::new(Arc::clone(&store)),
            store,
            clock,
            max_retries,
        }
    }

    pub fn state_log(&self) -> &StateLog {
        &self.state_log
    }

    /// Seller proposal; the auction starts in `PROPOSED`.
    pub async fn propose(&self, new: NewAuction) -> Result<Outcome<Auction>, AuctionError> {
        info!("{:<12} --> proposal from owner {}", "Lifecycle", new.owner_id);
        if !new.has_valid_terms() {
            return Ok(ResultCode::InvalidAuctionTerms.into());
        }
        if self.store.find_profile(new.owner_id).await?.is_none() {
            return Ok(ResultCode::ProfileNotFound.into());
        }
        let auction = self.store.create_auction(&new, self.clock.now()).await?;
        info!("{:<12} --> auction {} proposed", "Lifecycle", auction.id);
        Ok(Outcome::Accepted(auction))
    }

    /// PROPOSED -> PUBLISHED, assigning the category and approval date.
    pub async fn publish(
        &self,
        auction_id: i64,
        category_id: i64,
    ) -> Result<Outcome<StateEvent>, AuctionError> {
        retry_on_conflict("Lifecycle", auction_id, self.max_retries, || {
            self.try_publish(auction_id, category_id)
        })
        .await
    }

    async fn try_publish(
        &self,
        auction_id: i64,
        category_id: i64,
    ) -> Result<Outcome<StateEvent>, AuctionError> {
        let Some(auction) = self.store.find_auction(auction_id).await? else {
            return Ok(ResultCode::AuctionNotFound.into());
        };
        let current = self.state_log.require_state(auction_id).await?;
        if current != AuctionState::Proposed {
            info!(
                "{:<12} --> auction {} already evaluated ({})",
                "Lifecycle", auction_id, current
            );
            return Ok(ResultCode::AlreadyEvaluated.into());
        }
        if !self.store.category_exists(category_id).await? {
            return Ok(ResultCode::CategoryNotFound.into());
        }

        let now = self.clock.now();
        let publication = Publication {
            category_id,
            approval_date: now,
        };
        let event = self
            .state_log
            .append(
                auction.version,
                current,
                NewStateEvent::new(auction_id, AuctionState::Published, now),
                Some(publication),
            )
            .await?;
        Ok(Outcome::Accepted(event))
    }

    /// PROPOSED -> REJECTED. Comments are mandatory.
    pub async fn reject(
        &self,
        auction_id: i64,
        comments: &str,
    ) -> Result<Outcome<StateEvent>, AuctionError> {
        let comments = comments.trim();
        if comments.is_empty() {
            return Ok(ResultCode::CommentsRequired.into());
        }
        retry_on_conflict("Lifecycle", auction_id, self.max_retries, || {
            self.try_reject(auction_id, comments)
        })
        .await
    }

    async fn try_reject(
        &self,
        auction_id: i64,
        comments: &str,
    ) -> Result<Outcome<StateEvent>, AuctionError> {
        let Some(auction) = self.store.find_auction(auction_id).await? else {
            return Ok(ResultCode::AuctionNotFound.into());
        };
        let current = self.state_log.require_state(auction_id).await?;
        if current != AuctionState::Proposed {
            return Ok(ResultCode::AlreadyEvaluated.into());
        }
        let event = NewStateEvent::new(auction_id, AuctionState::Rejected, self.clock.now())
            .with_comments(comments);
        let event = self
            .state_log
            .append(auction.version, current, event, None)
            .await?;
        Ok(Outcome::Accepted(event))
    }

    /// PUBLISHED -> CLOSED (no winning offer). No-op once terminal.
    pub async fn close(&self, auction_id: i64) -> Result<Transition, AuctionError> {
        self.settle(
            auction_id,
            AuctionState::Closed,
            &[
                AuctionState::Rejected,
                AuctionState::Closed,
                AuctionState::Finished,
            ],
        )
        .await
    }

    /// PUBLISHED -> CONCRETIZED. No-op once concretized or finished.
    pub async fn concretize(&self, auction_id: i64) -> Result<Transition, AuctionError> {
        self.settle(
            auction_id,
            AuctionState::Concretized,
            &[AuctionState::Concretized, AuctionState::Finished],
        )
        .await
    }

    /// CONCRETIZED -> FINISHED. No-op once finished.
    pub async fn finish(&self, auction_id: i64) -> Result<Transition, AuctionError> {
        self.settle(auction_id, AuctionState::Finished, &[AuctionState::Finished])
            .await
    }

    async fn settle(
        &self,
        auction_id: i64,
        target: AuctionState,
        already_past: &[AuctionState],
    ) -> Result<Transition, AuctionError> {
        retry_on_conflict("Lifecycle", auction_id, self.max_retries, || {
            self.try_settle(auction_id, target, already_past)
        })
        .await
    }

    async fn try_settle(
        &self,
        auction_id: i64,
        target: AuctionState,
        already_past: &[AuctionState],
    ) -> Result<Transition, AuctionError> {
        let auction = self
            .store
            .find_auction(auction_id)
            .await?
            .ok_or_else(|| AuctionError::integrity(auction_id, "auction row missing"))?;
        let current = self.state_log.require_state(auction_id).await?;
        if already_past.contains(&current) {
            debug!(
                "{:<12} --> auction {} already {}, skipping {}",
                "Lifecycle", auction_id, current, target
            );
            return Ok(Transition::Skipped(current));
        }
        let event = self
            .state_log
            .append(
                auction.version,
                current,
                NewStateEvent::new(auction_id, target, self.clock.now()),
                None,
            )
            .await?;
        Ok(Transition::Applied(event))
    }
}
// endregion: --- Lifecycle Manager
