//! Rate-limited API scenarios.
//!
//! These only observe the remote quota. Requests are paced so they do not eat
//! into the window more than needed.

use std::time::Duration;

use chrono::Utc;
use log::info;

use super::ensure;
use crate::client::HttpClient;
use crate::error::HarnessError;
use crate::ratelimit::{
    ACCEPTED_BURST_STATUSES, BurstReport, RateLimitSnapshot, burst, is_quota_rejection, pace,
};

/// A single response carries a consistent quota snapshot.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn headers_present(
    client: &HttpClient,
    path: &str,
) -> Result<RateLimitSnapshot, HarnessError> {
    info!("scenario: rate-limit headers on {path}");
    let resp = client.get_raw(path, &[]).await?;
    let snapshot = RateLimitSnapshot::from_headers(resp.headers())?;
    snapshot.check_consistent(Utc::now())?;
    Ok(snapshot)
}

/// Two paced requests never see `remaining` grow within one window.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn remaining_decreases(
    client: &HttpClient,
    path: &str,
    delay: Duration,
) -> Result<(), HarnessError> {
    info!("scenario: remaining quota does not grow on {path}");
    let first = RateLimitSnapshot::from_headers(client.get_raw(path, &[]).await?.headers())?;
    pace(delay).await;
    let second = RateLimitSnapshot::from_headers(client.get_raw(path, &[]).await?.headers())?;
    ensure(first.remaining <= first.limit, || {
        format!(
            "remaining {} exceeds limit {}",
            first.remaining, first.limit
        )
    })?;
    first.check_progression(&second)
}

/// A burst of `size` concurrent requests gets accepted statuses and quota
/// headers on every response.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn burst_of(
    client: &HttpClient,
    path: &str,
    size: usize,
) -> Result<BurstReport, HarnessError> {
    info!("scenario: burst of {size} on {path}");
    let report = burst(client, path, size).await?;
    ensure(report.len() == size, || {
        format!("burst of {size} produced {} responses", report.len())
    })?;
    report.check_statuses(&ACCEPTED_BURST_STATUSES)?;
    report.snapshots()?;
    info!(
        "burst of {size}: {} throttled, statuses {:?}",
        report.throttled(),
        report.statuses()
    );
    Ok(report)
}

/// Every quota rejection in `report` reports an exhausted quota.
///
/// Refusals for other reasons, such as GitHub's secondary limits, are skipped.
///
/// # Errors
///
/// Returns the first failed expectation.
pub fn rejections_report_exhaustion(report: &BurstReport) -> Result<(), HarnessError> {
    for resp in report.responses() {
        if !is_quota_rejection(resp) {
            continue;
        }
        let status = resp.status();
        let snapshot = RateLimitSnapshot::from_headers(resp.headers())?;
        ensure(snapshot.is_exhausted(), || {
            format!(
                "{status} response still reports {} remaining",
                snapshot.remaining
            )
        })?;
    }
    Ok(())
}
