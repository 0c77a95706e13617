mod common;

use auction_house::handlers::{routes, AppState};
use auction_house::AuctionStore;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{Harness, ALICE, BOB, CATEGORY, SELLER};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    let store: Arc<dyn AuctionStore> = h.store.clone();
    routes(AppState {
        store,
        lifecycle: h.lifecycle.clone(),
        bids: h.bids.clone(),
        sweeper: h.sweeper.clone(),
    })
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_propose_and_publish() {
    let h = Harness::new();
    let (status, body) = send(
        app(&h),
        "POST",
        "/auctions",
        Some(json!({
            "title": "Desk lamp",
            "description": "Brass, working",
            "base_price": 40,
            "minimum_bid_increment": 5,
            "days_available": 4,
            "owner_id": SELLER
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = send(
        app(&h),
        "POST",
        &format!("/auctions/{}/publish", id),
        Some(json!({ "category_id": CATEGORY })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "PUBLISHED");

    let (status, body) = send(app(&h), "GET", &format!("/auctions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "PUBLISHED");
    assert_eq!(body["category_id"], CATEGORY);
    assert!(body["highest_offer"].is_null());
}

#[tokio::test]
async fn test_invalid_terms_are_bad_requests() {
    let h = Harness::new();
    let (status, body) = send(
        app(&h),
        "POST",
        "/auctions",
        Some(json!({
            "title": "Desk lamp",
            "description": "Brass, working",
            "base_price": -1,
            "minimum_bid_increment": null,
            "days_available": 4,
            "owner_id": SELLER
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AUCTION_TERMS");
}

#[tokio::test]
async fn test_bid_outcomes_map_to_codes() {
    let h = Harness::new();
    let auction = h.published(100, Some(10), 3).await;
    let uri = format!("/auctions/{}/bids", auction.id);

    let (status, body) = send(
        app(&h),
        "POST",
        &uri,
        Some(json!({ "bidder_id": ALICE, "amount": 95 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BASE_PRICE_NOT_FULFILLED");
    assert!(body["error"].is_string());

    let (status, body) = send(
        app(&h),
        "POST",
        &uri,
        Some(json!({ "bidder_id": SELLER, "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "AUCTION_OWNER");

    let (status, body) = send(
        app(&h),
        "POST",
        &uri,
        Some(json!({ "bidder_id": ALICE, "amount": 111 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["amount"], 111);

    let (status, body) = send(
        app(&h),
        "POST",
        &uri,
        Some(json!({ "bidder_id": ALICE, "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "EARLY_OFFER");

    let (status, body) = send(
        app(&h),
        "POST",
        &uri,
        Some(json!({ "bidder_id": BOB, "amount": 111 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "OFFER_OVERCOME");

    let (status, body) = send(app(&h), "GET", &format!("/auctions/{}/offers", auction.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_auction_is_not_found() {
    let h = Harness::new();
    let (status, body) = send(app(&h), "GET", "/auctions/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "AUCTION_NOT_FOUND");

    let (status, body) = send(
        app(&h),
        "POST",
        "/auctions/9999/bids",
        Some(json!({ "bidder_id": ALICE, "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "AUCTION_NOT_FOUND");
}

#[tokio::test]
async fn test_reject_and_blacklist() {
    let h = Harness::new();
    let proposed = h.propose(100, None, 3).await;
    let (status, body) = send(
        app(&h),
        "POST",
        &format!("/auctions/{}/reject", proposed.id),
        Some(json!({ "comments": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "COMMENTS_REQUIRED");

    let published = h.published(100, None, 3).await;
    let (status, body) = send(
        app(&h),
        "POST",
        &format!("/auctions/{}/blacklist", published.id),
        Some(json!({ "owner_id": ALICE, "profile_id": BOB })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_AUCTION_OWNER");

    let (status, _) = send(
        app(&h),
        "POST",
        &format!("/auctions/{}/blacklist", published.id),
        Some(json!({ "owner_id": SELLER, "profile_id": BOB })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app(&h),
        "POST",
        &format!("/auctions/{}/bids", published.id),
        Some(json!({ "bidder_id": BOB, "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "AUCTION_BLOCKED");
}

#[tokio::test]
async fn test_manual_sweep_reports_and_records_history() {
    let h = Harness::new();
    let auction = h.published(100, None, 1).await;
    assert!(h.bid(auction.id, ALICE, 150).await.is_accepted());
    h.advance_days(1);

    let (status, body) = send(app(&h), "POST", "/admin/sweep", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["examined"], 1);
    assert_eq!(body["finished"], 1);

    let (status, body) = send(app(&h), "GET", &format!("/auctions/{}/states", auction.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let states: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["PROPOSED", "PUBLISHED", "CONCRETIZED", "FINISHED"]);
}

#[tokio::test]
async fn test_unknown_bidder_and_oversized_window() {
    let h = Harness::new();
    let auction = h.published(100, None, 3).await;
    let (status, body) = send(
        app(&h),
        "POST",
        &format!("/auctions/{}/bids", auction.id),
        Some(json!({ "bidder_id": 404, "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PROFILE_NOT_FOUND");

    let (status, body) = send(
        app(&h),
        "POST",
        "/auctions",
        Some(json!({
            "title": "Desk lamp",
            "description": "Brass, working",
            "base_price": 40,
            "days_available": i32::MAX,
            "owner_id": SELLER
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AUCTION_TERMS");
}
