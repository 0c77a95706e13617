// region:    --- Imports
use crate::auction::model::AuctionState;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Result Codes
/// Expected business outcomes. These are returned, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    AuctionNotFound,
    AuctionOwner,
    AuctionFinished,
    AuctionBlocked,
    EarlyOffer,
    BasePriceNotFulfilled,
    MinimumBidNotFulfilled,
    OfferOvercome,
    AlreadyEvaluated,
    CategoryNotFound,
    CommentsRequired,
    InvalidAuctionTerms,
    ProfileNotFound,
    NotAuctionOwner,
}

impl ResultCode {
    /// Human-readable reason shown to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            ResultCode::AuctionNotFound => "The auction does not exist.",
            ResultCode::AuctionOwner => "The auctioneer cannot bid on their own auction.",
            ResultCode::AuctionFinished => "The auction is not open for bidding.",
            ResultCode::AuctionBlocked => "You are not allowed to bid on this auction.",
            ResultCode::EarlyOffer => "You must wait before placing another offer on this auction.",
            ResultCode::BasePriceNotFulfilled => "The offer is below the base price.",
            ResultCode::MinimumBidNotFulfilled => {
                "The offer does not exceed the current price by the minimum increment."
            }
            ResultCode::OfferOvercome => "A higher or equal offer has already been placed.",
            ResultCode::AlreadyEvaluated => "The auction has already been evaluated.",
            ResultCode::CategoryNotFound => "The category does not exist.",
            ResultCode::CommentsRequired => "A rejection requires comments.",
            ResultCode::InvalidAuctionTerms => "The auction terms are invalid.",
            ResultCode::ProfileNotFound => "The profile does not exist.",
            ResultCode::NotAuctionOwner => "Only the auctioneer can manage this auction.",
        }
    }
}

/// Either the value produced by an operation or the business reason it was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Accepted(T),
    Rejected(ResultCode),
}

impl<T> Outcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn rejection(&self) -> Option<ResultCode> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected(code) => Some(*code),
        }
    }
}

impl<T> From<ResultCode> for Outcome<T> {
    fn from(code: ResultCode) -> Self {
        Outcome::Rejected(code)
    }
}
// endregion: --- Result Codes

// region:    --- Errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("version conflict on auction {0}")]
    VersionConflict(i64),
    #[error("integrity error: {0}")]
    Integrity(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification payload could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Infrastructure and consistency failures of the auction core.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("auction {auction_id}: gave up after {attempts} conflicting attempts")]
    RetriesExhausted { auction_id: i64, attempts: u32 },
    #[error("auction {auction_id}: integrity error: {detail}")]
    Integrity { auction_id: i64, detail: String },
    #[error("auction {auction_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        auction_id: i64,
        from: AuctionState,
        to: AuctionState,
    },
}

impl AuctionError {
    pub fn integrity(auction_id: i64, detail: impl Into<String>) -> Self {
        AuctionError::Integrity {
            auction_id,
            detail: detail.into(),
        }
    }

    /// Data consistency failures are not worth retrying blindly.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            AuctionError::Integrity { .. } | AuctionError::Store(StoreError::Integrity(_))
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AuctionError::Store(StoreError::VersionConflict(_)))
    }
}

impl From<StoreError> for AuctionError {
    fn from(err: StoreError) -> Self {
        AuctionError::Store(err)
    }
}

impl From<sqlx::Error> for AuctionError {
    fn from(err: sqlx::Error) -> Self {
        AuctionError::Store(StoreError::Database(err))
    }
}
// endregion: --- Errors
