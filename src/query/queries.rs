/// Insert auction
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (title, description, base_price, minimum_bid_increment, days_available, owner_id, current_state, created_at, version)
    VALUES ($1, $2, $3, $4, $5, $6, 'PROPOSED', $7, 1)
    RETURNING id, title, description, base_price, minimum_bid_increment, approval_date, days_available, category_id, owner_id, notified_at, created_at, version
"#;

/// Get auction
pub const GET_AUCTION: &str = "SELECT id, title, description, base_price, minimum_bid_increment, approval_date, days_available, category_id, owner_id, notified_at, created_at, version FROM auctions WHERE id = $1";

/// Expired auctions still open for bidding
pub const GET_EXPIRED_PUBLISHED: &str = r#"
    SELECT id, title, description, base_price, minimum_bid_increment, approval_date, days_available, category_id, owner_id, notified_at, created_at, version
    FROM auctions
    WHERE current_state = 'PUBLISHED'
      AND settlement_held_at IS NULL
      AND approval_date IS NOT NULL
      AND approval_date + make_interval(days => days_available) <= $1
    ORDER BY id
"#;

/// Auctions by current state
pub const GET_AUCTIONS_BY_STATE: &str = "SELECT id, title, description, base_price, minimum_bid_increment, approval_date, days_available, category_id, owner_id, notified_at, created_at, version FROM auctions WHERE current_state = $1 AND settlement_held_at IS NULL ORDER BY id";

/// Compare-and-swap on the auction version, moving the state projection
pub const BUMP_VERSION_WITH_STATE: &str =
    "UPDATE auctions SET version = version + 1, current_state = $3 WHERE id = $1 AND version = $2";

/// Compare-and-swap on the auction version
pub const BUMP_VERSION: &str =
    "UPDATE auctions SET version = version + 1 WHERE id = $1 AND version = $2";

/// Publication fields
pub const SET_PUBLICATION: &str =
    "UPDATE auctions SET category_id = $2, approval_date = $3 WHERE id = $1";

/// Notification marker
pub const SET_NOTIFIED: &str =
    "UPDATE auctions SET notified_at = COALESCE(notified_at, $2) WHERE id = $1";

/// Settlement hold
pub const SET_SETTLEMENT_HOLD: &str = r#"
    UPDATE auctions
    SET settlement_held_at = COALESCE(settlement_held_at, $2),
        settlement_hold_reason = COALESCE(settlement_hold_reason, $3)
    WHERE id = $1
"#;

/// Insert state event
pub const INSERT_STATE_EVENT: &str = r#"
    INSERT INTO state_events (auction_id, state, applied_at, comments)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, state, applied_at, comments
"#;

/// State history
pub const GET_STATE_EVENTS: &str = r#"
    SELECT id, auction_id, state, applied_at, comments
    FROM state_events
    WHERE auction_id = $1
    ORDER BY applied_at ASC, id ASC
"#;

/// Insert offer
pub const INSERT_OFFER: &str = r#"
    INSERT INTO offers (auction_id, bidder_id, amount, creation_date)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, bidder_id, amount, creation_date
"#;

/// Offer history
pub const GET_OFFERS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, creation_date
    FROM offers
    WHERE auction_id = $1
    ORDER BY creation_date ASC, id ASC
"#;

/// Highest offer
pub const GET_HIGHEST_OFFER: &str = r#"
    SELECT id, auction_id, bidder_id, amount, creation_date
    FROM offers
    WHERE auction_id = $1
    ORDER BY amount DESC, id ASC
    LIMIT 1
"#;

/// Latest offer of one bidder
pub const GET_LATEST_OFFER_BY_BIDDER: &str = r#"
    SELECT id, auction_id, bidder_id, amount, creation_date
    FROM offers
    WHERE auction_id = $1 AND bidder_id = $2
    ORDER BY creation_date DESC, id DESC
    LIMIT 1
"#;

/// Blacklist membership
pub const IS_BLACKLISTED: &str =
    "SELECT EXISTS (SELECT 1 FROM blacklist_entries WHERE auction_id = $1 AND profile_id = $2)";

/// Insert blacklist entry
pub const INSERT_BLACKLIST_ENTRY: &str = r#"
    INSERT INTO blacklist_entries (auction_id, profile_id, creation_date)
    VALUES ($1, $2, $3)
    ON CONFLICT (auction_id, profile_id) DO NOTHING
"#;

/// Category existence
pub const CATEGORY_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)";

/// Get profile
pub const GET_PROFILE: &str = "SELECT id, name, email FROM profiles WHERE id = $1";
