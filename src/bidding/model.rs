use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Offer model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Offer {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub creation_date: DateTime<Utc>,
}

// Offer waiting to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub creation_date: DateTime<Utc>,
}

// Blacklist model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlacklistEntry {
    pub auction_id: i64,
    pub profile_id: i64,
    pub creation_date: DateTime<Utc>,
}
