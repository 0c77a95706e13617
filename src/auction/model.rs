use crate::error::AuctionError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// region:    --- Auction State
/// Lifecycle states recorded in the state log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionState {
    Proposed,
    Published,
    Rejected,
    Closed,
    Concretized,
    Finished,
}

impl AuctionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionState::Proposed => "PROPOSED",
            AuctionState::Published => "PUBLISHED",
            AuctionState::Rejected => "REJECTED",
            AuctionState::Closed => "CLOSED",
            AuctionState::Concretized => "CONCRETIZED",
            AuctionState::Finished => "FINISHED",
        }
    }

    /// No event may follow a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuctionState::Rejected | AuctionState::Closed | AuctionState::Finished
        )
    }

    /// Edges of the lifecycle graph.
    pub fn can_transition_to(&self, next: AuctionState) -> bool {
        matches!(
            (self, next),
            (AuctionState::Proposed, AuctionState::Published)
                | (AuctionState::Proposed, AuctionState::Rejected)
                | (AuctionState::Published, AuctionState::Closed)
                | (AuctionState::Published, AuctionState::Concretized)
                | (AuctionState::Concretized, AuctionState::Finished)
        )
    }
}

impl fmt::Display for AuctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROPOSED" => Ok(AuctionState::Proposed),
            "PUBLISHED" => Ok(AuctionState::Published),
            "REJECTED" => Ok(AuctionState::Rejected),
            "CLOSED" => Ok(AuctionState::Closed),
            "CONCRETIZED" => Ok(AuctionState::Concretized),
            "FINISHED" => Ok(AuctionState::Finished),
            other => Err(format!("unknown auction state: {}", other)),
        }
    }
}
// endregion: --- Auction State

// region:    --- Auction
/// Longest sale window a seller may ask for.
pub const MAX_DAYS_AVAILABLE: i32 = 365;

/// Auction model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub base_price: i64,
    pub minimum_bid_increment: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
    pub days_available: i32,
    pub category_id: Option<i64>,
    pub owner_id: i64,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Bumped by every state event or offer append; used for compare-and-swap.
    pub version: i64,
}

impl Auction {
    /// Absent increment counts as zero.
    pub fn increment(&self) -> i64 {
        self.minimum_bid_increment.unwrap_or(0)
    }

    /// `approval_date + days_available` days, once published.
    /// A window past the representable calendar is an integrity error.
    pub fn closes_at(&self) -> Result<Option<DateTime<Utc>>, AuctionError> {
        let Some(approved) = self.approval_date else {
            return Ok(None);
        };
        approved
            .checked_add_signed(Duration::days(i64::from(self.days_available)))
            .map(Some)
            .ok_or_else(|| {
                AuctionError::integrity(
                    self.id,
                    format!("sale window of {} days overflows", self.days_available),
                )
            })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> Result<bool, AuctionError> {
        Ok(self.closes_at()?.is_some_and(|closes_at| closes_at <= now))
    }
}

/// Seller proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub title: String,
    pub description: String,
    pub base_price: i64,
    #[serde(default)]
    pub minimum_bid_increment: Option<i64>,
    pub days_available: i32,
    pub owner_id: i64,
}

impl NewAuction {
    pub fn has_valid_terms(&self) -> bool {
        !self.title.trim().is_empty()
            && self.base_price >= 0
            && self.minimum_bid_increment.unwrap_or(0) >= 0
            && (1..=MAX_DAYS_AVAILABLE).contains(&self.days_available)
    }
}

/// Fields assigned when a moderator publishes an auction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Publication {
    pub category_id: i64,
    pub approval_date: DateTime<Utc>,
}
// endregion: --- Auction

// region:    --- Profile
/// Contact details of a seller or bidder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
}
// endregion: --- Profile
