//! Helper utilities for building requests and summarising exchanges.

use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::{BoxedStr, HarnessError};

/// Maximum number of characters kept from response bodies in errors and
/// transcripts.
pub(super) const BODY_SNIPPET_LEN: usize = 500;
/// Maximum number of characters kept from request payloads in transcripts.
pub(super) const REQUEST_SNIPPET_LEN: usize = 1024;

/// User agent sent unless the caller supplies their own.
pub(super) const DEFAULT_USER_AGENT: &str = concat!("apicheck/", env!("CARGO_PKG_VERSION"));

/// Trim `text` to `max` characters, appending `...` when truncated.
///
/// Returns an empty string when `max` is zero.
pub(crate) fn snippet(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out = text.chars().take(max).collect::<String>();
        out.push_str("...");
        out
    }
}

fn is_sensitive(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "token"
            | "authorization"
            | "password"
            | "secret"
            | "access_token"
            | "refresh_token"
            | "api_key"
            | "apikey"
            | "credentials"
    )
}

/// Recursively redact sensitive values from a JSON structure.
fn redact_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                if is_sensitive(k) {
                    *v = Value::String("<redacted>".into());
                } else {
                    redact_sensitive(v);
                }
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(redact_sensitive),
        _ => {}
    }
}

/// Redacted, truncated copy of a request payload for the transcript.
pub(super) fn payload_snippet(payload: &Value) -> Value {
    let mut redacted = payload.clone();
    redact_sensitive(&mut redacted);
    match &redacted {
        Value::String(s) => Value::String(snippet(s, REQUEST_SNIPPET_LEN)),
        _ if redacted.to_string().chars().count() > REQUEST_SNIPPET_LEN => {
            Value::String(snippet(&redacted.to_string(), REQUEST_SNIPPET_LEN))
        }
        _ => redacted,
    }
}

/// Merge caller headers over the defaults. Caller values win.
pub(super) fn build_headers(headers: &[(&str, &str)]) -> Result<HeaderMap, HarnessError> {
    let mut map = HeaderMap::new();
    map.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HarnessError::InvalidHeader {
                name: (*name).boxed(),
                message: e.to_string().boxed(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| HarnessError::InvalidHeader {
                name: (*name).boxed(),
                message: e.to_string().boxed(),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Parse `base` and make sure its path ends with `/` so joins stay beneath it.
pub(super) fn normalise_base(base: &str) -> Result<Url, HarnessError> {
    let mut url = Url::parse(base.trim()).map_err(|e| HarnessError::InvalidBaseUrl {
        url: base.boxed(),
        source: e,
    })?;
    let path = match url.path().trim_end_matches('/') {
        "" => "/".to_owned(),
        path => format!("{path}/"),
    };
    url.set_path(&path);
    Ok(url)
}

/// Resolve `path` beneath `base`, ignoring any leading `/`.
///
/// The path is always joined as a relative reference, so a first segment
/// holding `:` is never read as a scheme. Results above `base` are refused.
pub(super) fn join_path(base: &Url, path: &str) -> Result<Url, HarnessError> {
    let relative = format!("./{}", path.trim_start_matches('/'));
    let url = base
        .join(&relative)
        .map_err(|e| HarnessError::InvalidBaseUrl {
            url: format!("{base} + {path}").boxed(),
            source: e,
        })?;
    if url.as_str().starts_with(base.as_str()) {
        Ok(url)
    } else {
        Err(HarnessError::PathOutsideBase {
            base: base.as_str().boxed(),
            path: path.boxed(),
        })
    }
}
