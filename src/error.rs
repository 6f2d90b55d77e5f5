//! Error taxonomy for the harness.
//!
//! Transport failures, status mismatches, decode failures and scenario
//! assertion failures are kept apart so callers can tell a broken network
//! from a broken contract. Strings are boxed to keep the enum compact.

use std::borrow::Cow;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while building contexts, issuing requests or checking
/// responses.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: Box<str>,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid header {name}: {message}")]
    InvalidHeader { name: Box<str>, message: Box<str> },
    #[error("request failed when running {context}: {source}")]
    Transport {
        context: Box<str>,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}, expected 200 | body snippet: {snippet}")]
    UnexpectedStatus {
        method: Box<str>,
        url: Box<str>,
        status: StatusCode,
        snippet: Box<str>,
    },
    #[error("malformed response (status {status}): {message} | snippet: {snippet}")]
    BadResponseSerde {
        status: u16,
        message: Box<str>,
        snippet: Box<str>,
    },
    #[error("path {path} resolves outside base {base}")]
    PathOutsideBase { base: Box<str>, path: Box<str> },
    #[error("cannot serialise request body for {0}")]
    Payload(Box<str>),
    #[error("invalid entity: {0}")]
    InvalidEntity(Box<str>),
    #[error("rate-limit header {header}: {message}")]
    RateLimitHeader {
        header: &'static str,
        message: Box<str>,
    },
    #[error("assertion failed: {0}")]
    Assertion(Box<str>),
    #[error("io error: {0}")]
    Io(#[from] Box<std::io::Error>),
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl HarnessError {
    /// Returns `true` for expectation mismatches rather than infrastructure
    /// failures.
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::Assertion(_) | Self::UnexpectedStatus { .. } | Self::InvalidEntity(_)
        )
    }
}

/// Extension trait to convert string-like types into `Box<str>` without clutter.
pub trait BoxedStr {
    /// Box this value as `Box<str>`.
    fn boxed(self) -> Box<str>;
}

impl BoxedStr for String {
    fn boxed(self) -> Box<str> {
        self.into_boxed_str()
    }
}

impl BoxedStr for &str {
    fn boxed(self) -> Box<str> {
        self.into()
    }
}

impl BoxedStr for Cow<'_, str> {
    fn boxed(self) -> Box<str> {
        match self {
            Cow::Borrowed(s) => s.into(),
            Cow::Owned(s) => s.into_boxed_str(),
        }
    }
}
