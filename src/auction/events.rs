use super::model::AuctionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of one lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    /// Insertion order; breaks ties between equal `applied_at` values.
    pub id: i64,
    pub auction_id: i64,
    pub state: AuctionState,
    pub applied_at: DateTime<Utc>,
    pub comments: Option<String>,
}

/// State event waiting to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStateEvent {
    pub auction_id: i64,
    pub state: AuctionState,
    pub applied_at: DateTime<Utc>,
    pub comments: Option<String>,
}

impl NewStateEvent {
    pub fn new(auction_id: i64, state: AuctionState, applied_at: DateTime<Utc>) -> Self {
        Self {
            auction_id,
            state,
            applied_at,
            comments: None,
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }
}

/// State event as stored, with the state still in its text form.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StateEventRow {
    pub id: i64,
    pub auction_id: i64,
    pub state: String,
    pub applied_at: DateTime<Utc>,
    pub comments: Option<String>,
}

impl TryFrom<StateEventRow> for StateEvent {
    type Error = String;

    fn try_from(row: StateEventRow) -> Result<Self, Self::Error> {
        Ok(StateEvent {
            id: row.id,
            auction_id: row.auction_id,
            state: row.state.parse()?,
            applied_at: row.applied_at,
            comments: row.comments,
        })
    }
}
