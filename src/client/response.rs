//! Response captured from a single exchange.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::helpers::{BODY_SNIPPET_LEN, snippet};
use crate::error::{BoxedStr, HarnessError};

/// Status, headers and body of a completed request.
///
/// The body is read once as text. Structured decoding happens on demand
/// through [`ApiResponse::json`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    method: Method,
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    elapsed: Duration,
}

impl ApiResponse {
    pub(crate) fn new(
        method: Method,
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        body: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            method,
            url,
            status,
            headers,
            body,
            elapsed,
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, or `None` when absent or not valid ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Whether the response declares a JSON media type.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Wall-clock time from sending the request to reading the full body.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::BadResponseSerde`] naming the JSON path that
    /// failed to decode.
    pub fn json<T>(&self) -> Result<T, HarnessError>
    where
        T: DeserializeOwned,
    {
        let mut de = serde_json::Deserializer::from_str(&self.body);
        serde_path_to_error::deserialize::<_, T>(&mut de).map_err(|e| {
            let path = e.path().to_string();
            let inner = e.into_inner();
            HarnessError::BadResponseSerde {
                status: self.status.as_u16(),
                message: format!("{inner} at {path}").boxed(),
                snippet: self.snippet().boxed(),
            }
        })
    }

    /// The body trimmed for use in messages.
    #[must_use]
    pub fn snippet(&self) -> String {
        snippet(&self.body, BODY_SNIPPET_LEN)
    }
}
