//! Types shared by the request context.

use std::path::PathBuf;
use std::time::Duration;

/// Query-string pairs merged into a GET request.
///
/// Pass `&[]` when no parameters are needed.
pub type Params<'a> = &'a [(&'a str, &'a str)];

/// Optional knobs applied when the underlying client is built.
///
/// Every field defaults to "inherit from `reqwest`": no timeout is set and no
/// transcript is written unless asked for.
#[derive(Clone, Debug, Default)]
pub struct ClientOptions {
    /// Total timeout applied to each request.
    pub request_timeout: Option<Duration>,
    /// Timeout for establishing connections.
    pub connect_timeout: Option<Duration>,
    /// Append each exchange to this file as JSON lines.
    pub transcript: Option<PathBuf>,
}

impl ClientOptions {
    #[must_use]
    pub fn with_transcript(mut self, path: impl Into<PathBuf>) -> Self {
        self.transcript = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
