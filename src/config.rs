//! Configuration loading.
//!
//! Precedence is defaults < config file < environment. The file is taken from
//! `APICHECK_CONFIG_PATH` when set, otherwise `apicheck/config.toml` in the XDG
//! configuration directories. Environment keys use the `APICHECK_` prefix, for
//! example `APICHECK_CATALOG_URL`.

use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::client::ClientOptions;
use crate::error::HarnessError;

const ENV_PREFIX: &str = "APICHECK_";
const CONFIG_PATH_ENV: &str = "APICHECK_CONFIG_PATH";

/// Settings for live runs against the remote APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the product catalog.
    pub catalog_url: String,
    /// Base URL of the rate-limited API.
    pub rate_limit_url: String,
    /// Path requested on the rate-limited API.
    pub rate_limit_path: String,
    /// Token sent as a bearer credential to the rate-limited API.
    pub github_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    /// Pause between paced requests, in milliseconds.
    pub pace_ms: u64,
    /// Number of concurrent requests in a burst.
    pub burst_size: usize,
    /// Upper bound for a single catalog request, in milliseconds.
    pub response_time_budget_ms: u64,
    /// Write a JSON-lines transcript of every exchange here.
    pub transcript: Option<PathBuf>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://fakestoreapi.com".into(),
            rate_limit_url: "https://api.github.com".into(),
            rate_limit_path: "users/octocat".into(),
            github_token: None,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            pace_ms: 1_000,
            burst_size: 5,
            response_time_budget_ms: 3_000,
            transcript: None,
            log_level: None,
        }
    }
}

fn config_file() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    xdg::BaseDirectories::with_prefix("apicheck").find_config_file("config.toml")
}

impl HarnessConfig {
    /// Layer defaults, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] when a source cannot be parsed or a
    /// value has the wrong type.
    pub fn load() -> Result<Self, HarnessError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_file() {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config_path"]))
            .extract()
            .map_err(|e| HarnessError::Config(Box::new(e)))
    }

    /// Client options derived from the timeouts and transcript settings.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            transcript: self.transcript.clone(),
        }
    }

    /// Default headers for the catalog. They do not depend on configuration.
    #[must_use]
    pub fn catalog_headers() -> Vec<(&'static str, String)> {
        vec![("accept", "application/json".to_owned())]
    }

    /// Default headers for the rate-limited API, including the bearer token
    /// when configured.
    #[must_use]
    pub fn rate_limit_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("accept", "application/vnd.github+json".to_owned())];
        if let Some(token) = self.github_token.as_deref().filter(|t| !t.is_empty()) {
            headers.push(("authorization", format!("Bearer {token}")));
        }
        headers
    }

    #[must_use]
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    #[must_use]
    pub fn response_time_budget(&self) -> Duration {
        Duration::from_millis(self.response_time_budget_ms)
    }
}

/// Borrow owned header pairs in the shape [`crate::HttpClient::init`] takes.
#[must_use]
pub fn header_refs<'a>(headers: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    headers.iter().map(|(k, v)| (*k, v.as_str())).collect()
}
