//! Premium expiry arithmetic.

use chrono::{DateTime, Months, Utc};

use crate::error::{Error, Result};

/// One calendar year.
pub const DEFAULT_EXTENSION_MONTHS: u32 = 12;

/// Compute the new `premium_until` after an approval.
///
/// When the current expiry is still in the future the extension stacks on top
/// of it; otherwise (never premium, or lapsed) it starts from `now`. The result
/// is never earlier than `current`.
///
/// Month arithmetic is calendar based: Feb 29 plus twelve months is Feb 28.
pub fn extend_premium(current: Option<i64>, now: i64, months: u32) -> Result<i64> {
    let base = match current {
        Some(until) if until > now => until,
        _ => now,
    };

    let start = DateTime::<Utc>::from_timestamp(base, 0).ok_or(Error::ExpiryOutOfRange(base))?;
    start
        .checked_add_months(Months::new(months))
        .map(|t| t.timestamp())
        .ok_or(Error::ExpiryOutOfRange(base))
}

/// Whether a profile with this expiry has premium access at `now`.
pub fn is_premium_active(premium_until: Option<i64>, now: i64) -> bool {
    premium_until.is_some_and(|until| until > now)
}
