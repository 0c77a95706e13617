#![allow(dead_code)]

use async_trait::async_trait;
use auction_house::auction::model::{Auction, NewAuction, Profile};
use auction_house::bidding::commands::{BidValidator, PlaceBidCommand};
use auction_house::bidding::model::Offer;
use auction_house::config::SweepConfig;
use auction_house::error::NotifyError;
use auction_house::notifier::{Notifier, SaleSummary};
use auction_house::{
    AuctionStore, Clock, ClosingSweeper, InMemoryStore, LifecycleManager, MockClock, Outcome,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SELLER: i64 = 1;
pub const ALICE: i64 = 2;
pub const BOB: i64 = 3;
pub const CAROL: i64 = 4;
pub const CATEGORY: i64 = 10;

/// Notifier that records every sale and can be told to fail or stall.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sales: Mutex<Vec<SaleSummary>>,
    failing: Mutex<HashSet<i64>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, auction_id: i64) {
        self.failing.lock().unwrap().insert(auction_id);
    }

    pub fn recover(&self, auction_id: i64) {
        self.failing.lock().unwrap().remove(&auction_id);
    }

    pub fn stall(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn sales(&self) -> Vec<SaleSummary> {
        self.sales.lock().unwrap().clone()
    }

    pub fn sales_for(&self, auction_id: i64) -> Vec<SaleSummary> {
        self.sales()
            .into_iter()
            .filter(|s| s.auction_id == auction_id)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_sale(&self, sale: &SaleSummary) -> Result<(), NotifyError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&sale.auction_id) {
            return Err(NotifyError::Transport("mail server unreachable".to_string()));
        }
        self.sales.lock().unwrap().push(sale.clone());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: MockClock,
    pub lifecycle: Arc<LifecycleManager>,
    pub bids: Arc<BidValidator>,
    pub sweeper: Arc<ClosingSweeper>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_sweep(SweepConfig {
            interval: Duration::from_secs(300),
            concurrency: 4,
            notify_timeout: Duration::from_millis(200),
        })
    }

    pub fn with_sweep(sweep: SweepConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        for (id, name) in [(SELLER, "Sam"), (ALICE, "Alice"), (BOB, "Bob"), (CAROL, "Carol")] {
            store.insert_profile(Profile {
                id,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
            });
        }
        store.insert_category(CATEGORY);

        let clock = MockClock::default();
        let shared_store: Arc<dyn AuctionStore> = store.clone();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let notifier = Arc::new(RecordingNotifier::default());

        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::clone(&shared_store),
            Arc::clone(&shared_clock),
            10,
        ));
        let bids = Arc::new(BidValidator::new(
            Arc::clone(&shared_store),
            Arc::clone(&shared_clock),
            chrono::Duration::minutes(10),
            64,
        ));
        let sweeper = Arc::new(ClosingSweeper::new(
            shared_store,
            Arc::clone(&lifecycle),
            notifier.clone(),
            shared_clock,
            sweep,
        ));

        Self {
            store,
            clock,
            lifecycle,
            bids,
            sweeper,
            notifier,
        }
    }

    pub async fn propose(&self, base_price: i64, increment: Option<i64>, days: i32) -> Auction {
        let outcome = self
            .lifecycle
            .propose(NewAuction {
                title: "Vintage camera".to_string(),
                description: "Rangefinder, 1950s".to_string(),
                base_price,
                minimum_bid_increment: increment,
                days_available: days,
                owner_id: SELLER,
            })
            .await
            .unwrap();
        match outcome {
            Outcome::Accepted(auction) => auction,
            Outcome::Rejected(code) => panic!("proposal rejected: {:?}", code),
        }
    }

    pub async fn published(&self, base_price: i64, increment: Option<i64>, days: i32) -> Auction {
        let auction = self.propose(base_price, increment, days).await;
        let outcome = self.lifecycle.publish(auction.id, CATEGORY).await.unwrap();
        assert!(outcome.is_accepted(), "publish failed: {:?}", outcome);
        self.store.find_auction(auction.id).await.unwrap().unwrap()
    }

    pub async fn bid(&self, auction_id: i64, bidder_id: i64, amount: i64) -> Outcome<Offer> {
        self.bids
            .place_bid(PlaceBidCommand {
                auction_id,
                bidder_id,
                amount,
            })
            .await
            .unwrap()
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(chrono::Duration::days(days));
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}
