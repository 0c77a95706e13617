// region:    --- Imports
use super::DatabaseManager;
use crate::auction::events::{NewStateEvent, StateEvent, StateEventRow};
use crate::auction::model::{Auction, AuctionState, NewAuction, Profile, Publication};
use crate::bidding::model::{BlacklistEntry, NewOffer, Offer};
use crate::error::StoreError;
use crate::query::queries;
use crate::store::AuctionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

// endregion: --- Imports

// region:    --- Postgres Store
/// `AuctionStore` on PostgreSQL. Appends run in one transaction guarded by
/// a compare-and-swap on `auctions.version`.
pub struct PostgresAuctionStore {
    db: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

fn into_event(row: StateEventRow) -> Result<StateEvent, StoreError> {
    let id = row.id;
    StateEvent::try_from(row)
        .map_err(|e| StoreError::Integrity(format!("state event {}: {}", id, e)))
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn create_auction(
        &self,
        new: &NewAuction,
        created_at: DateTime<Utc>,
    ) -> Result<Auction, StoreError> {
        let new = new.clone();
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    let auction = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
                        .bind(&new.title)
                        .bind(&new.description)
                        .bind(new.base_price)
                        .bind(new.minimum_bid_increment)
                        .bind(new.days_available)
                        .bind(new.owner_id)
                        .bind(created_at)
                        .fetch_one(&mut **tx)
                        .await?;

                    sqlx::query_as::<_, StateEventRow>(queries::INSERT_STATE_EVENT)
                        .bind(auction.id)
                        .bind(AuctionState::Proposed.as_str())
                        .bind(created_at)
                        .bind(None::<String>)
                        .fetch_one(&mut **tx)
                        .await?;

                    Ok::<_, StoreError>(auction)
                })
            })
            .await
    }

    async fn find_auction(&self, auction_id: i64) -> Result<Option<Auction>, StoreError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(auction_id)
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn state_events(&self, auction_id: i64) -> Result<Vec<StateEvent>, StoreError> {
        sqlx::query_as::<_, StateEventRow>(queries::GET_STATE_EVENTS)
            .bind(auction_id)
            .fetch_all(self.db.pool())
            .await?
            .into_iter()
            .map(into_event)
            .collect()
    }

    async fn append_state(
        &self,
        expected_version: i64,
        event: NewStateEvent,
        publication: Option<Publication>,
    ) -> Result<StateEvent, StoreError> {
        let auction_id = event.auction_id;
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    let bumped = sqlx::query(queries::BUMP_VERSION_WITH_STATE)
                        .bind(auction_id)
                        .bind(expected_version)
                        .bind(event.state.as_str())
                        .execute(&mut **tx)
                        .await?;
                    if bumped.rows_affected() == 0 {
                        debug!(
                            "{:<12} --> stale version {} for auction {}",
                            "Store", expected_version, auction_id
                        );
                        return Err(StoreError::VersionConflict(auction_id));
                    }

                    if let Some(publication) = publication {
                        sqlx::query(queries::SET_PUBLICATION)
                            .bind(auction_id)
                            .bind(publication.category_id)
                            .bind(publication.approval_date)
                            .execute(&mut **tx)
                            .await?;
                    }

                    let row = sqlx::query_as::<_, StateEventRow>(queries::INSERT_STATE_EVENT)
                        .bind(auction_id)
                        .bind(event.state.as_str())
                        .bind(event.applied_at)
                        .bind(event.comments)
                        .fetch_one(&mut **tx)
                        .await?;
                    into_event(row)
                })
            })
            .await
    }

    async fn offers(&self, auction_id: i64) -> Result<Vec<Offer>, StoreError> {
        Ok(sqlx::query_as::<_, Offer>(queries::GET_OFFERS)
            .bind(auction_id)
            .fetch_all(self.db.pool())
            .await?)
    }

    async fn highest_offer(&self, auction_id: i64) -> Result<Option<Offer>, StoreError> {
        Ok(sqlx::query_as::<_, Offer>(queries::GET_HIGHEST_OFFER)
            .bind(auction_id)
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn latest_offer_by(
        &self,
        auction_id: i64,
        bidder_id: i64,
    ) -> Result<Option<Offer>, StoreError> {
        Ok(
            sqlx::query_as::<_, Offer>(queries::GET_LATEST_OFFER_BY_BIDDER)
                .bind(auction_id)
                .bind(bidder_id)
                .fetch_optional(self.db.pool())
                .await?,
        )
    }

    async fn append_offer(
        &self,
        expected_version: i64,
        offer: NewOffer,
    ) -> Result<Offer, StoreError> {
        let auction_id = offer.auction_id;
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    let bumped = sqlx::query(queries::BUMP_VERSION)
                        .bind(auction_id)
                        .bind(expected_version)
                        .execute(&mut **tx)
                        .await?;
                    if bumped.rows_affected() == 0 {
                        return Err(StoreError::VersionConflict(auction_id));
                    }

                    Ok(sqlx::query_as::<_, Offer>(queries::INSERT_OFFER)
                        .bind(auction_id)
                        .bind(offer.bidder_id)
                        .bind(offer.amount)
                        .bind(offer.creation_date)
                        .fetch_one(&mut **tx)
                        .await?)
                })
            })
            .await
    }

    async fn is_blacklisted(&self, auction_id: i64, profile_id: i64) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, bool>(queries::IS_BLACKLISTED)
            .bind(auction_id)
            .bind(profile_id)
            .fetch_one(self.db.pool())
            .await?)
    }

    async fn add_blacklist_entry(&self, entry: &BlacklistEntry) -> Result<(), StoreError> {
        sqlx::query(queries::INSERT_BLACKLIST_ENTRY)
            .bind(entry.auction_id)
            .bind(entry.profile_id)
            .bind(entry.creation_date)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn category_exists(&self, category_id: i64) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, bool>(queries::CATEGORY_EXISTS)
            .bind(category_id)
            .fetch_one(self.db.pool())
            .await?)
    }

    async fn find_profile(&self, profile_id: i64) -> Result<Option<Profile>, StoreError> {
        Ok(sqlx::query_as::<_, Profile>(queries::GET_PROFILE)
            .bind(profile_id)
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn find_expired_published(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Auction>, StoreError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_EXPIRED_PUBLISHED)
            .bind(now)
            .fetch_all(self.db.pool())
            .await?)
    }

    async fn find_by_state(&self, state: AuctionState) -> Result<Vec<Auction>, StoreError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_AUCTIONS_BY_STATE)
            .bind(state.as_str())
            .fetch_all(self.db.pool())
            .await?)
    }

    async fn mark_notified(&self, auction_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(queries::SET_NOTIFIED)
            .bind(auction_id)
            .bind(at)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn hold_settlement(
        &self,
        auction_id: i64,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), StoreError> {
        let held = sqlx::query(queries::SET_SETTLEMENT_HOLD)
            .bind(auction_id)
            .bind(at)
            .bind(reason)
            .execute(self.db.pool())
            .await?;
        if held.rows_affected() == 0 {
            return Err(StoreError::Integrity(format!(
                "auction {} does not exist",
                auction_id
            )));
        }
        Ok(())
    }
}
// endregion: --- Postgres Store
