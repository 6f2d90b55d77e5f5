//! HTTP API test harness.
//!
//! [`HttpClient`] binds a base URL and default headers to one `reqwest`
//! client and offers verb helpers; [`catalog`] and [`ratelimit`] give typed
//! views of the two remote APIs; [`scenarios`] holds the checks run against
//! them.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod ratelimit;
pub mod scenarios;

pub use client::{ApiResponse, ClientOptions, HttpClient, Params};
pub use config::HarnessConfig;
pub use error::HarnessError;
