//! Timestamps for `updated_at`
//!
//! Stores order profiles by `updated_at`, so two writes must never share a
//! timestamp. [`MonotonicClock`] hands out strictly increasing instants at
//! microsecond precision, the resolution they are persisted at.

use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next instant, strictly after every instant handed out or observed
    pub fn now(&self) -> Result<DateTime<Utc>> {
        let mut last = self
            .last
            .lock()
            .map_err(|_| Error::Backend("clock lock poisoned".into()))?;
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        Ok(now)
    }

    /// Record a persisted instant so later stamps sort after it
    pub fn observe(&self, seen: DateTime<Utc>) {
        if let Ok(mut last) = self.last.lock() {
            if last.is_none_or(|prev| seen > prev) {
                *last = Some(seen);
            }
        }
    }
}

/// Text form used in SQLite columns; sorts lexicographically.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse either our RFC 3339 form or SQLite's `CURRENT_TIMESTAMP` form
/// (`YYYY-MM-DD HH:MM:SS`, UTC), which older rows carry.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Backend(format!("invalid timestamp '{}': {}", raw, e)))
}
