//! Concurrent request bursts against a rate-limited endpoint.

use futures::future::join_all;
use log::info;
use reqwest::StatusCode;

use super::RateLimitSnapshot;
use crate::client::{ApiResponse, HttpClient};
use crate::error::{BoxedStr, HarnessError};

/// Statuses a rate-limited API may legitimately answer a burst with.
pub const ACCEPTED_BURST_STATUSES: [StatusCode; 3] = [
    StatusCode::OK,
    StatusCode::FORBIDDEN,
    StatusCode::TOO_MANY_REQUESTS,
];

/// Whether `resp` was refused because the primary quota ran out.
///
/// Every 429 counts. A 403 only counts when its body names the rate limit and
/// is not one of GitHub's secondary-limit refusals, which arrive with quota
/// still left.
#[must_use]
pub fn is_quota_rejection(resp: &ApiResponse) -> bool {
    match resp.status() {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => {
            let body = resp.text().to_ascii_lowercase();
            body.contains("rate limit") && !body.contains("secondary")
        }
        _ => false,
    }
}

/// Responses gathered from one burst, in issue order.
#[derive(Debug)]
pub struct BurstReport {
    responses: Vec<ApiResponse>,
}

/// Issue `size` GETs of `path` concurrently over one shared context and wait
/// for all of them.
///
/// # Errors
///
/// Returns the first transport failure; no partial report is produced.
pub async fn burst(
    client: &HttpClient,
    path: &str,
    size: usize,
) -> Result<BurstReport, HarnessError> {
    info!("issuing burst of {size} requests to {path}");
    let results = join_all((0..size).map(|_| client.get_raw(path, &[]))).await;
    let responses = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(BurstReport { responses })
}

impl BurstReport {
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    #[must_use]
    pub fn responses(&self) -> &[ApiResponse] {
        &self.responses
    }

    #[must_use]
    pub fn statuses(&self) -> Vec<StatusCode> {
        self.responses.iter().map(ApiResponse::status).collect()
    }

    /// Number of responses that were rejected by the remote quota.
    #[must_use]
    pub fn throttled(&self) -> usize {
        self.responses
            .iter()
            .filter(|r| r.status() != StatusCode::OK)
            .count()
    }

    /// Require every status to be in `accepted`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Assertion`] listing the unexpected statuses.
    pub fn check_statuses(&self, accepted: &[StatusCode]) -> Result<(), HarnessError> {
        let unexpected: Vec<String> = self
            .responses
            .iter()
            .filter(|r| !accepted.contains(&r.status()))
            .map(|r| r.status().as_u16().to_string())
            .collect();
        if unexpected.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::Assertion(
                format!("unexpected burst statuses: {}", unexpected.join(", ")).boxed(),
            ))
        }
    }

    /// Snapshot of every response, requiring a positive limit on each.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::RateLimitHeader`] when a response lacks quota
    /// headers and [`HarnessError::Assertion`] when a limit is zero.
    pub fn snapshots(&self) -> Result<Vec<RateLimitSnapshot>, HarnessError> {
        self.responses
            .iter()
            .map(|r| {
                let snap = RateLimitSnapshot::from_headers(r.headers())?;
                if snap.limit == 0 {
                    return Err(HarnessError::Assertion(
                        format!("response from {} reports a zero limit", r.url()).boxed(),
                    ));
                }
                Ok(snap)
            })
            .collect()
    }
}
