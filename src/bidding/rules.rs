//! Pure admission rules for offers.

use crate::error::ResultCode;
use chrono::{DateTime, Duration, Utc};

/// Default per-bidder cooldown between two offers on the same auction.
pub const DEFAULT_COOLDOWN_SECS: i64 = 600;

/// Longest cooldown the service accepts (one week).
pub const MAX_COOLDOWN_SECS: i64 = 7 * 24 * 60 * 60;

/// A bidder's own previous offer must be at least `cooldown` old.
pub fn check_cooldown(
    last_offer_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Result<(), ResultCode> {
    match last_offer_at {
        Some(last) if now - last < cooldown => Err(ResultCode::EarlyOffer),
        _ => Ok(()),
    }
}

/// Amount rules, in order: base price, current top offer, minimum increment.
///
/// With no prior offer the increment is measured from the base price, so the
/// opening offer has to beat `base_price + increment`.
pub fn check_amount(
    base_price: i64,
    increment: i64,
    top_offer: Option<i64>,
    amount: i64,
) -> Result<(), ResultCode> {
    if amount < base_price {
        return Err(ResultCode::BasePriceNotFulfilled);
    }
    if top_offer.unwrap_or(0) >= amount {
        return Err(ResultCode::OfferOvercome);
    }
    let reference = top_offer.unwrap_or(base_price);
    if increment >= amount - reference {
        return Err(ResultCode::MinimumBidNotFulfilled);
    }
    Ok(())
}
