//! Timestamp helpers.

use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC time truncated to microseconds, the precision timestamps are
/// stored with. Values returned to clients match what a later read returns.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
