//! Append-only lifecycle record per auction.
//!
//! The current status of an auction is never stored as the source of truth:
//! it is the state of the latest event, ordered by `applied_at` with ties
//! broken by insertion order.

// region:    --- Imports
use crate::auction::events::{NewStateEvent, StateEvent};
use crate::auction::model::{AuctionState, Publication};
use crate::error::{AuctionError, StoreError};
use crate::store::AuctionStore;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- State Log
/// Latest event by `applied_at`, ties broken by id.
pub fn latest<'a>(events: impl IntoIterator<Item = &'a StateEvent>) -> Option<&'a StateEvent> {
    events.into_iter().max_by(|a, b| {
        a.applied_at
            .cmp(&b.applied_at)
            .then_with(|| a.id.cmp(&b.id))
    })
}

#[derive(Clone)]
pub struct StateLog {
    store: Arc<dyn AuctionStore>,
}

impl StateLog {
    pub fn new(store: Arc<dyn AuctionStore>) -> Self {
        Self { store }
    }

    pub async fn history(&self, auction_id: i64) -> Result<Vec<StateEvent>, StoreError> {
        self.store.state_events(auction_id).await
    }

    /// `None` when the auction has no recorded state at all.
    pub async fn current_state(&self, auction_id: i64) -> Result<Option<AuctionState>, StoreError> {
        let events = self.store.state_events(auction_id).await?;
        Ok(latest(&events).map(|e| e.state))
    }

    /// Like `current_state`, but a missing record is an integrity failure.
    pub async fn require_state(&self, auction_id: i64) -> Result<AuctionState, AuctionError> {
        self.current_state(auction_id)
            .await?
            .ok_or_else(|| AuctionError::integrity(auction_id, "no state record found"))
    }

    /// Appends `event` after checking it follows the current state.
    /// Only the lifecycle manager calls this.
    pub(crate) async fn append(
        &self,
        expected_version: i64,
        current: AuctionState,
        event: NewStateEvent,
        publication: Option<Publication>,
    ) -> Result<StateEvent, AuctionError> {
        if !current.can_transition_to(event.state) {
            return Err(AuctionError::InvalidTransition {
                auction_id: event.auction_id,
                from: current,
                to: event.state,
            });
        }
        let stored = self
            .store
            .append_state(expected_version, event, publication)
            .await?;
        info!(
            "{:<12} --> auction {}: {} -> {}",
            "StateLog", stored.auction_id, current, stored.state
        );
        Ok(stored)
    }
}
// endregion: --- State Log

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: i64, state: AuctionState, second: u32) -> StateEvent {
        StateEvent {
            id,
            auction_id: 1,
            state,
            applied_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap(),
            comments: None,
        }
    }

    #[test]
    fn test_latest_orders_by_applied_at() {
        let events = vec![
            event(2, AuctionState::Published, 5),
            event(1, AuctionState::Proposed, 0),
        ];
        assert_eq!(latest(&events).map(|e| e.state), Some(AuctionState::Published));
    }

    #[test]
    fn test_latest_breaks_ties_by_insertion_order() {
        let events = vec![
            event(1, AuctionState::Proposed, 0),
            event(2, AuctionState::Published, 0),
        ];
        assert_eq!(latest(&events).map(|e| e.id), Some(2));
    }

    #[test]
    fn test_latest_of_empty_log() {
        let events: Vec<StateEvent> = Vec::new();
        assert!(latest(&events).is_none());
    }
}
