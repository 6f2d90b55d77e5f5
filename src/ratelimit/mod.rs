//! Observation of a remote API's rate-limit headers.
//!
//! Nothing here limits anything: snapshots only describe the quota window the
//! remote reports through `x-ratelimit-*` headers.

mod burst;

use std::time::Duration;

use chrono::{DateTime, TimeZone as _, Utc};
use log::debug;
use reqwest::header::HeaderMap;

use crate::error::{BoxedStr, HarnessError};

pub use self::burst::{ACCEPTED_BURST_STATUSES, BurstReport, burst, is_quota_rejection};

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota window reported by one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Requests allowed per window.
    pub limit: u64,
    /// Requests left in the current window.
    pub remaining: u64,
    /// Window reset time in seconds since the Unix epoch.
    pub reset: i64,
}

fn header_str<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<&'h str, HarnessError> {
    let value = headers.get(name).ok_or(HarnessError::RateLimitHeader {
        header: name,
        message: "missing".boxed(),
    })?;
    value
        .to_str()
        .map(str::trim)
        .map_err(|e| HarnessError::RateLimitHeader {
            header: name,
            message: e.to_string().boxed(),
        })
}

fn parse_header<T>(headers: &HeaderMap, name: &'static str) -> Result<T, HarnessError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = header_str(headers, name)?;
    raw.parse().map_err(|e: T::Err| HarnessError::RateLimitHeader {
        header: name,
        message: format!("{raw:?}: {e}").boxed(),
    })
}

impl RateLimitSnapshot {
    /// Parse the three quota headers.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::RateLimitHeader`] naming the first header that
    /// is missing or not an integer. A negative `remaining` is rejected here.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, HarnessError> {
        Ok(Self {
            limit: parse_header(headers, LIMIT_HEADER)?,
            remaining: parse_header(headers, REMAINING_HEADER)?,
            reset: parse_header(headers, RESET_HEADER)?,
        })
    }

    /// Like [`RateLimitSnapshot::from_headers`] but `None` when any header is
    /// absent or malformed.
    #[must_use]
    pub fn try_from_headers(headers: &HeaderMap) -> Option<Self> {
        Self::from_headers(headers).ok()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Reset time, or `None` when the timestamp is out of range.
    #[must_use]
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.reset, 0).single()
    }

    /// Whether two snapshots describe the same quota window.
    #[must_use]
    pub fn same_window(&self, other: &Self) -> bool {
        self.limit == other.limit && self.reset == other.reset
    }

    /// Check the snapshot is internally consistent at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Assertion`] when `limit` is zero, `remaining`
    /// exceeds `limit`, or the reset time is not after `now`.
    pub fn check_consistent(&self, now: DateTime<Utc>) -> Result<(), HarnessError> {
        if self.limit == 0 {
            return Err(HarnessError::Assertion("rate limit is zero".boxed()));
        }
        if self.remaining > self.limit {
            return Err(HarnessError::Assertion(
                format!(
                    "remaining {} exceeds limit {}",
                    self.remaining, self.limit
                )
                .boxed(),
            ));
        }
        if self.reset <= now.timestamp() {
            return Err(HarnessError::Assertion(
                format!(
                    "reset {} is not after now ({})",
                    self.reset,
                    now.timestamp()
                )
                .boxed(),
            ));
        }
        Ok(())
    }

    /// Check that `later` follows `self` within one window.
    ///
    /// Within the same window `remaining` must not grow. When the window has
    /// rolled over the quota may be replenished, so only the bound against
    /// `limit` is enforced.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Assertion`] describing the violation.
    pub fn check_progression(&self, later: &Self) -> Result<(), HarnessError> {
        if later.remaining > later.limit {
            return Err(HarnessError::Assertion(
                format!(
                    "remaining {} exceeds limit {}",
                    later.remaining, later.limit
                )
                .boxed(),
            ));
        }
        if self.same_window(later) && later.remaining > self.remaining {
            return Err(HarnessError::Assertion(
                format!(
                    "remaining grew from {} to {} within window resetting at {}",
                    self.remaining, later.remaining, self.reset
                )
                .boxed(),
            ));
        }
        Ok(())
    }
}

/// Sleep between requests so paced requests do not disturb the remote window.
pub async fn pace(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    debug!("pausing {}ms before next request", delay.as_millis());
    tokio::time::sleep(delay).await;
}
