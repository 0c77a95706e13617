// region:    --- Imports
use crate::auction::model::NewAuction;
use crate::bidding::commands::{BidValidator, BlockBidderCommand, PlaceBidCommand};
use crate::error::{AuctionError, Outcome, ResultCode};
use crate::lifecycle::LifecycleManager;
use crate::query;
use crate::scheduler::ClosingSweeper;
use crate::store::AuctionStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- State & Router
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub lifecycle: Arc<LifecycleManager>,
    pub bids: Arc<BidValidator>,
    pub sweeper: Arc<ClosingSweeper>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/auctions", post(handle_propose))
        .route("/auctions/:id", get(handle_get_auction))
        .route("/auctions/:id/offers", get(handle_get_offers))
        .route("/auctions/:id/states", get(handle_get_states))
        .route("/auctions/:id/publish", post(handle_publish))
        .route("/auctions/:id/reject", post(handle_reject))
        .route("/auctions/:id/bids", post(handle_bid))
        .route("/auctions/:id/blacklist", post(handle_blacklist))
        .route("/admin/sweep", post(handle_sweep))
        .with_state(state)
}
// endregion: --- State & Router

// region:    --- Responses
impl ResultCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ResultCode::AuctionNotFound
            | ResultCode::CategoryNotFound
            | ResultCode::ProfileNotFound => StatusCode::NOT_FOUND,
            ResultCode::AuctionOwner
            | ResultCode::AuctionBlocked
            | ResultCode::NotAuctionOwner => StatusCode::FORBIDDEN,
            ResultCode::AuctionFinished
            | ResultCode::AlreadyEvaluated
            | ResultCode::OfferOvercome => StatusCode::CONFLICT,
            ResultCode::EarlyOffer => StatusCode::TOO_MANY_REQUESTS,
            ResultCode::BasePriceNotFulfilled
            | ResultCode::MinimumBidNotFulfilled
            | ResultCode::CommentsRequired
            | ResultCode::InvalidAuctionTerms => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ResultCode {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({
                "error": self.message(),
                "code": self,
            })),
        )
            .into_response()
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        // Details stay in the log.
        error!("{:<12} --> {}", "Handler", self);
        let status = if self.is_integrity() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (
            status,
            Json(serde_json::json!({
                "error": "The service is temporarily unavailable, please try again later.",
                "code": "TRY_AGAIN_LATER",
            })),
        )
            .into_response()
    }
}

fn respond<T: Serialize>(result: Result<Outcome<T>, AuctionError>, success: StatusCode) -> Response {
    match result {
        Ok(Outcome::Accepted(value)) => (success, Json(value)).into_response(),
        Ok(Outcome::Rejected(code)) => code.into_response(),
        Err(e) => e.into_response(),
    }
}
// endregion: --- Responses

// region:    --- Command Handlers
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub category_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub comments: String,
}

#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub bidder_id: i64,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct BlacklistRequest {
    pub owner_id: i64,
    pub profile_id: i64,
}

/// Seller proposal
pub async fn handle_propose(
    State(state): State<AppState>,
    Json(new): Json<NewAuction>,
) -> Response {
    info!("{:<12} --> propose: {:?}", "Handler", new.title);
    respond(state.lifecycle.propose(new).await, StatusCode::CREATED)
}

/// Moderator approval
pub async fn handle_publish(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(req): Json<PublishRequest>,
) -> Response {
    info!("{:<12} --> publish id: {}", "Handler", auction_id);
    respond(
        state.lifecycle.publish(auction_id, req.category_id).await,
        StatusCode::OK,
    )
}

/// Moderator rejection
pub async fn handle_reject(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(req): Json<RejectRequest>,
) -> Response {
    info!("{:<12} --> reject id: {}", "Handler", auction_id);
    respond(
        state.lifecycle.reject(auction_id, &req.comments).await,
        StatusCode::OK,
    )
}

/// Place a bid
pub async fn handle_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(req): Json<BidRequest>,
) -> Response {
    let cmd = PlaceBidCommand {
        auction_id,
        bidder_id: req.bidder_id,
        amount: req.amount,
    };
    respond(state.bids.place_bid(cmd).await, StatusCode::CREATED)
}

/// Bar a profile from bidding
pub async fn handle_blacklist(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(req): Json<BlacklistRequest>,
) -> Response {
    let cmd = BlockBidderCommand {
        auction_id,
        requester_id: req.owner_id,
        profile_id: req.profile_id,
    };
    respond(state.bids.block_bidder(cmd).await, StatusCode::OK)
}

/// Manual closing sweep
pub async fn handle_sweep(State(state): State<AppState>) -> Response {
    info!("{:<12} --> manual sweep", "Handler");
    match state.sweeper.run_once().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => e.into_response(),
    }
}
// endregion: --- Command Handlers

// region:    --- Query Handlers

/// Auction detail
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Response {
    match query::handlers::get_auction_view(state.store.as_ref(), auction_id).await {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => ResultCode::AuctionNotFound.into_response(),
        Err(e) => AuctionError::from(e).into_response(),
    }
}

/// Offer history
pub async fn handle_get_offers(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Response {
    match query::handlers::get_offer_history(state.store.as_ref(), auction_id).await {
        Ok(offers) => Json(offers).into_response(),
        Err(e) => AuctionError::from(e).into_response(),
    }
}

/// State history
pub async fn handle_get_states(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Response {
    match query::handlers::get_state_history(state.store.as_ref(), auction_id).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => AuctionError::from(e).into_response(),
    }
}

// endregion: --- Query Handlers
