mod common;

use auction_house::auction::model::{AuctionState, NewAuction, Profile};
use auction_house::config::SweepConfig;
use auction_house::scheduler::Settlement;
use auction_house::{AuctionStore, SweepReport};
use common::{Harness, ALICE, BOB, CAROL, CATEGORY, SELLER};
use std::time::Duration;

async fn state_of(h: &Harness, auction_id: i64) -> AuctionState {
    h.lifecycle
        .state_log()
        .require_state(auction_id)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_nothing_to_settle() {
    let h = Harness::new();
    h.published(100, None, 3).await;
    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report, SweepReport::default());
}

#[tokio::test]
async fn test_expired_without_offers_is_closed() {
    let h = Harness::new();
    let auction = h.published(100, None, 1).await;
    h.advance_days(1);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.closed, 1);
    assert_eq!(state_of(&h, auction.id).await, AuctionState::Closed);
    assert!(h.notifier.sales().is_empty());
}

#[tokio::test]
async fn test_sold_auction_notifies_the_winner_once() {
    let h = Harness::new();
    let auction = h.published(50, None, 2).await;
    assert!(h.bid(auction.id, ALICE, 80).await.is_accepted());
    assert!(h.bid(auction.id, BOB, 120).await.is_accepted());
    h.advance_days(3);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.finished, 1);
    assert_eq!(report.failed, 0);

    let sales = h.notifier.sales_for(auction.id);
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].amount, 120);
    assert_eq!(sales[0].winner.id, BOB);
    assert_eq!(sales[0].seller.id, SELLER);
    assert_eq!(sales[0].sold_at, h.now());

    let states: Vec<AuctionState> = h
        .lifecycle
        .state_log()
        .history(auction.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.state)
        .collect();
    assert_eq!(
        states,
        vec![
            AuctionState::Proposed,
            AuctionState::Published,
            AuctionState::Concretized,
            AuctionState::Finished
        ]
    );
    let stored = h.store.find_auction(auction.id).await.unwrap().unwrap();
    assert!(stored.notified_at.is_some());

    // A second tick finds nothing left to do.
    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(h.notifier.sales_for(auction.id).len(), 1);
}

#[tokio::test]
async fn test_auctions_still_open_are_left_alone() {
    let h = Harness::new();
    let short = h.published(100, None, 1).await;
    let long = h.published(100, None, 5).await;
    assert!(h.bid(long.id, ALICE, 150).await.is_accepted());
    h.advance_days(1);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(state_of(&h, short.id).await, AuctionState::Closed);
    assert_eq!(state_of(&h, long.id).await, AuctionState::Published);
    // The open auction keeps taking bids.
    assert!(h.bid(long.id, BOB, 200).await.is_accepted());
}

#[tokio::test]
async fn test_notifier_failure_is_isolated() {
    let h = Harness::new();
    let failing = h.published(100, None, 1).await;
    let healthy = h.published(100, None, 1).await;
    let empty = h.published(100, None, 1).await;
    assert!(h.bid(failing.id, ALICE, 150).await.is_accepted());
    assert!(h.bid(healthy.id, CAROL, 300).await.is_accepted());
    h.notifier.fail_for(failing.id);
    h.advance_days(1);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.finished, 1);
    assert_eq!(report.closed, 1);
    assert_eq!(state_of(&h, failing.id).await, AuctionState::Concretized);
    assert_eq!(state_of(&h, healthy.id).await, AuctionState::Finished);
    assert_eq!(state_of(&h, empty.id).await, AuctionState::Closed);

    // Once the transport is back the stuck auction is picked up again.
    h.notifier.recover(failing.id);
    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.finished, 1);
    assert_eq!(state_of(&h, failing.id).await, AuctionState::Finished);
    assert_eq!(h.notifier.sales_for(failing.id).len(), 1);
    assert_eq!(h.notifier.sales_for(healthy.id).len(), 1);
}

#[tokio::test]
async fn test_slow_notifier_times_out() {
    let h = Harness::with_sweep(SweepConfig {
        interval: Duration::from_secs(300),
        concurrency: 2,
        notify_timeout: Duration::from_millis(50),
    });
    let auction = h.published(100, None, 1).await;
    assert!(h.bid(auction.id, ALICE, 150).await.is_accepted());
    h.notifier.stall(Duration::from_millis(500));
    h.advance_days(1);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(state_of(&h, auction.id).await, AuctionState::Concretized);
    assert!(h.notifier.sales().is_empty());
}

#[tokio::test]
async fn test_missing_profile_is_an_integrity_failure() {
    let h = Harness::new();
    // Written straight to the store so the owner check is bypassed.
    let orphan = h
        .store
        .create_auction(
            &NewAuction {
                title: "Orphan".to_string(),
                description: "Owner profile was removed".to_string(),
                base_price: 100,
                minimum_bid_increment: None,
                days_available: 1,
                owner_id: 404,
            },
            h.now(),
        )
        .await
        .unwrap();
    assert!(h
        .lifecycle
        .publish(orphan.id, CATEGORY)
        .await
        .unwrap()
        .is_accepted());
    assert!(h.bid(orphan.id, ALICE, 150).await.is_accepted());

    let sound = h.published(100, None, 1).await;
    assert!(h.bid(sound.id, BOB, 150).await.is_accepted());
    h.advance_days(1);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.finished, 1);
    // Nothing was recorded for the broken auction.
    assert_eq!(state_of(&h, orphan.id).await, AuctionState::Published);
    assert_eq!(state_of(&h, sound.id).await, AuctionState::Finished);
    assert!(h.notifier.sales_for(orphan.id).is_empty());

    // Held auctions are not examined again on later ticks.
    for _ in 0..3 {
        let report = h.sweeper.run_once().await.unwrap();
        assert_eq!(report, SweepReport::default());
    }
    assert_eq!(state_of(&h, orphan.id).await, AuctionState::Published);
}

#[tokio::test]
async fn test_missing_winner_profile_in_stuck_settlement_is_held() {
    let h = Harness::new();
    let auction = h.published(100, None, 1).await;
    let ghost = 77;
    h.store.insert_profile(Profile {
        id: ghost,
        name: "Ghost".to_string(),
        email: "ghost@example.com".to_string(),
    });
    assert!(h.bid(auction.id, ghost, 150).await.is_accepted());
    h.advance_days(1);
    // A previous tick concretized the sale; the winner has since vanished.
    h.lifecycle.concretize(auction.id).await.unwrap();
    h.store.remove_profile(ghost);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.failed, 1);
    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(state_of(&h, auction.id).await, AuctionState::Concretized);
}

#[tokio::test]
async fn test_overflowing_window_does_not_stop_the_sweep() {
    let h = Harness::new();
    // Written straight to the store so the term check is bypassed.
    let broken = h
        .store
        .create_auction(
            &NewAuction {
                title: "Forever".to_string(),
                description: "Window past the calendar".to_string(),
                base_price: 100,
                minimum_bid_increment: None,
                days_available: i32::MAX,
                owner_id: SELLER,
            },
            h.now(),
        )
        .await
        .unwrap();
    assert!(h
        .lifecycle
        .publish(broken.id, CATEGORY)
        .await
        .unwrap()
        .is_accepted());
    let sound = h.published(100, None, 1).await;
    h.advance_days(1);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.closed, 1);
    assert_eq!(state_of(&h, sound.id).await, AuctionState::Closed);
    assert_eq!(state_of(&h, broken.id).await, AuctionState::Published);
}

#[tokio::test]
async fn test_settle_skips_auctions_moved_on_elsewhere() {
    let h = Harness::new();
    let auction = h.published(100, None, 1).await;
    h.advance_days(1);
    h.lifecycle.close(auction.id).await.unwrap();

    let settlement = h.sweeper.settle(auction.clone()).await.unwrap();
    assert_eq!(settlement, Settlement::Skipped(AuctionState::Closed));
}

#[tokio::test]
async fn test_already_notified_auction_is_not_notified_again() {
    let h = Harness::new();
    let auction = h.published(100, None, 1).await;
    assert!(h.bid(auction.id, ALICE, 150).await.is_accepted());
    h.advance_days(1);

    // A previous tick notified but stopped before finishing.
    h.lifecycle.concretize(auction.id).await.unwrap();
    h.store.mark_notified(auction.id, h.now()).await.unwrap();

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.finished, 1);
    assert_eq!(state_of(&h, auction.id).await, AuctionState::Finished);
    assert!(h.notifier.sales().is_empty());
}

#[tokio::test]
async fn test_many_auctions_in_one_tick() {
    let h = Harness::new();
    let mut sold = vec![];
    for i in 0..12 {
        let auction = h.published(100, None, 1).await;
        if i % 3 != 0 {
            assert!(h.bid(auction.id, ALICE, 200 + i).await.is_accepted());
            sold.push(auction.id);
        }
    }
    h.advance_days(2);

    let report = h.sweeper.run_once().await.unwrap();
    assert_eq!(report.examined, 12);
    assert_eq!(report.closed, 4);
    assert_eq!(report.finished, 8);
    for id in sold {
        assert_eq!(h.notifier.sales_for(id).len(), 1);
    }
}

#[tokio::test]
async fn test_timer_drives_the_sweep() {
    let h = Harness::with_sweep(SweepConfig {
        interval: Duration::from_millis(20),
        concurrency: 4,
        notify_timeout: Duration::from_millis(200),
    });
    let auction = h.published(100, None, 1).await;
    assert!(h.bid(auction.id, ALICE, 150).await.is_accepted());
    h.advance_days(1);

    let handle = h.sweeper.clone().start();
    let mut state = state_of(&h, auction.id).await;
    for _ in 0..100 {
        if state == AuctionState::Finished {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        state = state_of(&h, auction.id).await;
    }
    handle.abort();

    assert_eq!(state, AuctionState::Finished);
    assert_eq!(h.notifier.sales_for(auction.id).len(), 1);
}
