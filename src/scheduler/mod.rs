//! Closing sweep
//! Periodically settles auctions whose sale window has expired:
//! no offers -> CLOSED, otherwise CONCRETIZED -> notify -> FINISHED.
//! Each auction is settled independently; one failure never aborts the tick.

// region:    --- Imports
use crate::auction::model::{Auction, AuctionState};
use crate::bidding::model::Offer;
use crate::clock::Clock;
use crate::config::SweepConfig;
use crate::error::{AuctionError, NotifyError};
use crate::lifecycle::{LifecycleManager, Transition};
use crate::notifier::{Notifier, SaleSummary};
use crate::store::AuctionStore;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Sweep Report
/// How one auction ended up after a settlement attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Closed,
    Finished { winner_id: i64, amount: i64 },
    /// Someone else already moved the auction on.
    Skipped(AuctionState),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub closed: usize,
    pub finished: usize,
    pub skipped: usize,
    pub failed: usize,
}
// endregion: --- Sweep Report

// region:    --- Closing Sweeper
pub struct ClosingSweeper {
    store: Arc<dyn AuctionStore>,
    lifecycle: Arc<LifecycleManager>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: SweepConfig,
    tick_lock: Mutex<()>,
}

impl ClosingSweeper {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        lifecycle: Arc<LifecycleManager>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: SweepConfig,
    ) -> Self {
        Self {
            store,
            lifecycle,
            notifier,
            clock,
            config,
            tick_lock: Mutex::new(()),
        }
    }

    /// Start the timer-driven sweep.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "{:<12} --> closing sweep every {:?}",
            "Sweeper", self.config.interval
        );
        tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!("{:<12} --> sweep tick failed: {}", "Sweeper", e);
                }
            }
        })
    }

    /// One sweep tick. Only a failure to list candidates fails the whole tick.
    pub async fn run_once(&self) -> Result<SweepReport, AuctionError> {
        // Manual triggers and the timer never run concurrently.
        let _guard = self.tick_lock.lock().await;

        let now = self.clock.now();
        let mut candidates = self.store.find_expired_published(now).await?;
        // Concretized auctions left behind by an interrupted tick.
        candidates.extend(self.store.find_by_state(AuctionState::Concretized).await?);

        let mut report = SweepReport {
            examined: candidates.len(),
            ..SweepReport::default()
        };
        if candidates.is_empty() {
            debug!("{:<12} --> nothing to settle", "Sweeper");
            return Ok(report);
        }

        let results: Vec<(i64, Result<Settlement, AuctionError>)> = stream::iter(candidates)
            .map(|auction| self.settle_one(auction))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        for (auction_id, result) in results {
            match result {
                Ok(Settlement::Closed) => report.closed += 1,
                Ok(Settlement::Finished { .. }) => report.finished += 1,
                Ok(Settlement::Skipped(state)) => {
                    debug!(
                        "{:<12} --> auction {} skipped ({})",
                        "Sweeper", auction_id, state
                    );
                    report.skipped += 1;
                }
                Err(e) if e.is_integrity() => {
                    error!(
                        "{:<12} --> auction {} held out of settlement, integrity: {}",
                        "Sweeper", auction_id, e
                    );
                    if let Err(hold) = self
                        .store
                        .hold_settlement(auction_id, self.clock.now(), &e.to_string())
                        .await
                    {
                        error!(
                            "{:<12} --> auction {} could not be held: {}",
                            "Sweeper", auction_id, hold
                        );
                    }
                    report.failed += 1;
                }
                Err(e) => {
                    error!(
                        "{:<12} --> auction {} not settled: {}",
                        "Sweeper", auction_id, e
                    );
                    report.failed += 1;
                }
            }
        }

        info!("{:<12} --> sweep done: {:?}", "Sweeper", report);
        Ok(report)
    }

    async fn settle_one(&self, auction: Auction) -> (i64, Result<Settlement, AuctionError>) {
        let auction_id = auction.id;
        (auction_id, self.settle(auction).await)
    }

    /// Drives one auction as far towards a terminal state as it can.
    /// The sale summary is built before `concretize`, so missing profiles
    /// leave the auction untouched.
    pub async fn settle(&self, auction: Auction) -> Result<Settlement, AuctionError> {
        let state = self.lifecycle.state_log().require_state(auction.id).await?;
        match state {
            AuctionState::Published => {
                let Some(top) = self.store.highest_offer(auction.id).await? else {
                    return Ok(match self.lifecycle.close(auction.id).await? {
                        Transition::Applied(_) => {
                            info!("{:<12} --> auction {} closed", "Sweeper", auction.id);
                            Settlement::Closed
                        }
                        Transition::Skipped(state) => Settlement::Skipped(state),
                    });
                };
                let sale = self.sale_summary(&auction, &top).await?;
                if let Transition::Skipped(state) = self.lifecycle.concretize(auction.id).await? {
                    return Ok(Settlement::Skipped(state));
                }
                self.notify_and_finish(sale).await
            }
            AuctionState::Concretized => {
                let top = self.store.highest_offer(auction.id).await?.ok_or_else(|| {
                    AuctionError::integrity(auction.id, "concretized auction has no offers")
                })?;
                warn!(
                    "{:<12} --> resuming settlement of concretized auction {}",
                    "Sweeper", auction.id
                );
                let sale = self.sale_summary(&auction, &top).await?;
                self.notify_and_finish(sale).await
            }
            other => Ok(Settlement::Skipped(other)),
        }
    }

    /// Notify at most once per auction, then finish.
    async fn notify_and_finish(&self, sale: SaleSummary) -> Result<Settlement, AuctionError> {
        let auction_id = sale.auction_id;
        let auction = self
            .store
            .find_auction(auction_id)
            .await?
            .ok_or_else(|| AuctionError::integrity(auction_id, "auction row missing"))?;

        if auction.notified_at.is_none() {
            match timeout(self.config.notify_timeout, self.notifier.notify_sale(&sale)).await {
                Ok(result) => result?,
                Err(_) => return Err(NotifyError::Timeout(self.config.notify_timeout).into()),
            }
            self.store.mark_notified(auction_id, self.clock.now()).await?;
            info!(
                "{:<12} --> auction {} sale notified: winner {} at {}",
                "Sweeper", auction_id, sale.winner.id, sale.amount
            );
        } else {
            debug!(
                "{:<12} --> auction {} already notified",
                "Sweeper", auction_id
            );
        }

        match self.lifecycle.finish(auction_id).await? {
            Transition::Applied(_) => Ok(Settlement::Finished {
                winner_id: sale.winner.id,
                amount: sale.amount,
            }),
            Transition::Skipped(state) => Ok(Settlement::Skipped(state)),
        }
    }

    async fn sale_summary(
        &self,
        auction: &Auction,
        top: &Offer,
    ) -> Result<SaleSummary, AuctionError> {
        let seller = self
            .store
            .find_profile(auction.owner_id)
            .await?
            .ok_or_else(|| AuctionError::integrity(auction.id, "seller profile missing"))?;
        let winner = self
            .store
            .find_profile(top.bidder_id)
            .await?
            .ok_or_else(|| AuctionError::integrity(auction.id, "winner profile missing"))?;
        Ok(SaleSummary {
            auction_id: auction.id,
            title: auction.title.clone(),
            seller,
            winner,
            amount: top.amount,
            sold_at: self.clock.now(),
        })
    }
}
// endregion: --- Closing Sweeper
