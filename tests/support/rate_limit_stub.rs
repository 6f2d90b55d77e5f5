//! Quota-tracking stub that mimics `x-ratelimit-*` headers.

use super::{Handler, set_handler};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Reset timestamp one hour from now.
pub fn reset_in_an_hour() -> i64 {
    chrono::Utc::now().timestamp() + 3_600
}

/// Install a quota of `limit` requests. Once spent, requests are answered with
/// `rejection` and a zero `remaining`.
///
/// Returns the counter of remaining requests.
pub fn install(handler: &Handler, limit: u64, rejection: StatusCode) -> Arc<AtomicU64> {
    let remaining = Arc::new(AtomicU64::new(limit));
    let counter = Arc::clone(&remaining);
    let reset = reset_in_an_hour();
    set_handler(handler, move |_req| {
        let left = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|before| before - 1);
        let (status, left, body) = match left {
            Ok(left) => (StatusCode::OK, left, json!({ "login": "octocat" })),
            Err(_) => (
                rejection,
                0,
                json!({ "message": "API rate limit exceeded" }),
            ),
        };
        quota_response(status, limit, left, reset, &body)
    });
    remaining
}

/// Build a response carrying explicit quota headers.
pub fn quota_response(
    status: StatusCode,
    limit: u64,
    remaining: u64,
    reset: i64,
    body: &serde_json::Value,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .header("x-ratelimit-limit", limit.to_string())
        .header("x-ratelimit-remaining", remaining.to_string())
        .header("x-ratelimit-reset", reset.to_string())
        .body(Full::from(body.to_string()))
        .expect("build response")
}
