//! Age-based classification of stock items.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Items at least this many days old are flagged for consumption.
pub const WARNING_AFTER_DAYS: i64 = 90;

/// Items at least this many days old are considered stale.
pub const STALE_AFTER_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Fresh,
    Warning,
    Stale,
}

impl Freshness {
    pub fn label(&self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Warning => "warning",
            Freshness::Stale => "stale",
        }
    }
}

/// Classify an item by whole days elapsed between `added_at` and `now`.
///
/// A missing or unreadable date never raises an alarm.
pub fn classify(added_at: Option<NaiveDateTime>, now: NaiveDateTime) -> Freshness {
    let Some(added_at) = added_at else {
        return Freshness::Fresh;
    };
    let days = now.signed_duration_since(added_at).num_days();
    if days >= STALE_AFTER_DAYS {
        Freshness::Stale
    } else if days >= WARNING_AFTER_DAYS {
        Freshness::Warning
    } else {
        Freshness::Fresh
    }
}
