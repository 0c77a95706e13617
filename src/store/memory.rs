// region:    --- Imports
use super::AuctionStore;
use crate::auction::events::{NewStateEvent, StateEvent};
use crate::auction::model::{Auction, AuctionState, NewAuction, Profile, Publication};
use crate::bidding::model::{BlacklistEntry, NewOffer, Offer};
use crate::error::StoreError;
use crate::state_log;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

// endregion: --- Imports

// region:    --- In-Memory Store
#[derive(Default)]
struct Inner {
    auctions: HashMap<i64, Auction>,
    events: Vec<StateEvent>,
    offers: Vec<Offer>,
    blacklist: Vec<BlacklistEntry>,
    categories: HashSet<i64>,
    profiles: HashMap<i64, Profile>,
    /// Auctions held out of settlement, with the reason.
    held: HashMap<i64, String>,
    next_auction_id: i64,
    next_event_id: i64,
    next_offer_id: i64,
}

impl Inner {
    fn events_of(&self, auction_id: i64) -> Vec<StateEvent> {
        let mut events: Vec<StateEvent> = self
            .events
            .iter()
            .filter(|e| e.auction_id == auction_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then(a.id.cmp(&b.id)));
        events
    }

    fn current_state(&self, auction_id: i64) -> Option<AuctionState> {
        state_log::latest(self.events.iter().filter(|e| e.auction_id == auction_id))
            .map(|e| e.state)
    }

    /// Current state of every auction in one pass over the log.
    fn current_states(&self) -> HashMap<i64, AuctionState> {
        let mut latest: HashMap<i64, &StateEvent> = HashMap::new();
        for event in &self.events {
            latest
                .entry(event.auction_id)
                .and_modify(|current| {
                    if state_log::latest([*current, event]) == Some(event) {
                        *current = event;
                    }
                })
                .or_insert(event);
        }
        latest.into_iter().map(|(id, e)| (id, e.state)).collect()
    }

    /// Unheld auctions whose current state is `state`, by id.
    fn settleable_in(&self, state: AuctionState) -> Vec<&Auction> {
        let states = self.current_states();
        let mut matching: Vec<&Auction> = self
            .auctions
            .values()
            .filter(|a| !self.held.contains_key(&a.id))
            .filter(|a| states.get(&a.id) == Some(&state))
            .collect();
        matching.sort_by_key(|a| a.id);
        matching
    }

    /// Checks the expected version and bumps it, all under the lock.
    fn claim_version(&mut self, auction_id: i64, expected_version: i64) -> Result<(), StoreError> {
        let auction = self.auctions.get_mut(&auction_id).ok_or_else(|| {
            StoreError::Integrity(format!("auction {} does not exist", auction_id))
        })?;
        if auction.version != expected_version {
            return Err(StoreError::VersionConflict(auction_id));
        }
        auction.version += 1;
        Ok(())
    }

    fn push_event(&mut self, event: NewStateEvent) -> StateEvent {
        self.next_event_id += 1;
        let stored = StateEvent {
            id: self.next_event_id,
            auction_id: event.auction_id,
            state: event.state,
            applied_at: event.applied_at,
            comments: event.comments,
        };
        self.events.push(stored.clone());
        stored
    }
}

/// Store kept entirely in process memory. Used by tests and by the service
/// when no database is configured.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.lock().profiles.insert(profile.id, profile);
    }

    pub fn remove_profile(&self, profile_id: i64) -> Option<Profile> {
        self.lock().profiles.remove(&profile_id)
    }

    pub fn insert_category(&self, category_id: i64) {
        self.lock().categories.insert(category_id);
    }
}

#[async_trait]
impl AuctionStore for InMemoryStore {
    async fn create_auction(
        &self,
        new: &NewAuction,
        created_at: DateTime<Utc>,
    ) -> Result<Auction, StoreError> {
        let mut inner = self.lock();
        inner.next_auction_id += 1;
        let auction = Auction {
            id: inner.next_auction_id,
            title: new.title.clone(),
            description: new.description.clone(),
            base_price: new.base_price,
            minimum_bid_increment: new.minimum_bid_increment,
            approval_date: None,
            days_available: new.days_available,
            category_id: None,
            owner_id: new.owner_id,
            notified_at: None,
            created_at,
            version: 1,
        };
        inner.auctions.insert(auction.id, auction.clone());
        inner.push_event(NewStateEvent::new(
            auction.id,
            AuctionState::Proposed,
            created_at,
        ));
        Ok(auction)
    }

    async fn find_auction(&self, auction_id: i64) -> Result<Option<Auction>, StoreError> {
        Ok(self.lock().auctions.get(&auction_id).cloned())
    }

    async fn state_events(&self, auction_id: i64) -> Result<Vec<StateEvent>, StoreError> {
        Ok(self.lock().events_of(auction_id))
    }

    async fn append_state(
        &self,
        expected_version: i64,
        event: NewStateEvent,
        publication: Option<Publication>,
    ) -> Result<StateEvent, StoreError> {
        let mut inner = self.lock();
        inner.claim_version(event.auction_id, expected_version)?;
        if let Some(publication) = publication {
            if let Some(auction) = inner.auctions.get_mut(&event.auction_id) {
                auction.category_id = Some(publication.category_id);
                auction.approval_date = Some(publication.approval_date);
            }
        }
        Ok(inner.push_event(event))
    }

    async fn offers(&self, auction_id: i64) -> Result<Vec<Offer>, StoreError> {
        let inner = self.lock();
        let mut offers: Vec<Offer> = inner
            .offers
            .iter()
            .filter(|o| o.auction_id == auction_id)
            .cloned()
            .collect();
        offers.sort_by(|a, b| a.creation_date.cmp(&b.creation_date).then(a.id.cmp(&b.id)));
        Ok(offers)
    }

    async fn highest_offer(&self, auction_id: i64) -> Result<Option<Offer>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .offers
            .iter()
            .filter(|o| o.auction_id == auction_id)
            // Equal amounts cannot both be accepted; prefer the earliest anyway.
            .max_by(|a, b| a.amount.cmp(&b.amount).then(b.id.cmp(&a.id)))
            .cloned())
    }

    async fn latest_offer_by(
        &self,
        auction_id: i64,
        bidder_id: i64,
    ) -> Result<Option<Offer>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .offers
            .iter()
            .filter(|o| o.auction_id == auction_id && o.bidder_id == bidder_id)
            .max_by(|a, b| a.creation_date.cmp(&b.creation_date).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn append_offer(
        &self,
        expected_version: i64,
        offer: NewOffer,
    ) -> Result<Offer, StoreError> {
        let mut inner = self.lock();
        inner.claim_version(offer.auction_id, expected_version)?;
        inner.next_offer_id += 1;
        let stored = Offer {
            id: inner.next_offer_id,
            auction_id: offer.auction_id,
            bidder_id: offer.bidder_id,
            amount: offer.amount,
            creation_date: offer.creation_date,
        };
        inner.offers.push(stored.clone());
        Ok(stored)
    }

    async fn is_blacklisted(&self, auction_id: i64, profile_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .blacklist
            .iter()
            .any(|b| b.auction_id == auction_id && b.profile_id == profile_id))
    }

    async fn add_blacklist_entry(&self, entry: &BlacklistEntry) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let exists = inner
            .blacklist
            .iter()
            .any(|b| b.auction_id == entry.auction_id && b.profile_id == entry.profile_id);
        if !exists {
            inner.blacklist.push(entry.clone());
        }
        Ok(())
    }

    async fn category_exists(&self, category_id: i64) -> Result<bool, StoreError> {
        Ok(self.lock().categories.contains(&category_id))
    }

    async fn find_profile(&self, profile_id: i64) -> Result<Option<Profile>, StoreError> {
        Ok(self.lock().profiles.get(&profile_id).cloned())
    }

    async fn find_expired_published(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Auction>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .settleable_in(AuctionState::Published)
            .into_iter()
            // An unrepresentable window never expires.
            .filter(|a| matches!(a.is_expired(now), Ok(true)))
            .cloned()
            .collect())
    }

    async fn find_by_state(&self, state: AuctionState) -> Result<Vec<Auction>, StoreError> {
        let inner = self.lock();
        Ok(inner.settleable_in(state).into_iter().cloned().collect())
    }

    async fn mark_notified(&self, auction_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let auction = inner.auctions.get_mut(&auction_id).ok_or_else(|| {
            StoreError::Integrity(format!("auction {} does not exist", auction_id))
        })?;
        auction.notified_at.get_or_insert(at);
        Ok(())
    }

    async fn hold_settlement(
        &self,
        auction_id: i64,
        _at: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.auctions.contains_key(&auction_id) {
            return Err(StoreError::Integrity(format!(
                "auction {} does not exist",
                auction_id
            )));
        }
        inner
            .held
            .entry(auction_id)
            .or_insert_with(|| reason.to_string());
        Ok(())
    }
}
// endregion: --- In-Memory Store
