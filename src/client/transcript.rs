//! Transcript logging of request/response exchanges.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::Path;
use std::sync::Mutex;

use log::warn;
use serde_json::{Value, json};

use super::helpers::payload_snippet;
use super::response::ApiResponse;
use crate::error::HarnessError;

/// Append-only JSON-lines sink shared by concurrent requests.
#[derive(Debug)]
pub(super) struct Transcript {
    sink: Mutex<BufWriter<File>>,
}

impl Transcript {
    pub(super) fn open(path: &Path) -> Result<Self, HarnessError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(Box::new)?;
        Ok(Self {
            sink: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Record one exchange. Failures are logged, never propagated.
    pub(super) fn record(&self, request: Option<&Value>, resp: &ApiResponse) {
        let line = json!({
            "method": resp.method().as_str(),
            "url": resp.url().as_str(),
            "status": resp.status().as_u16(),
            "elapsed_ms": u64::try_from(resp.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request": request.map(payload_snippet),
            "response": resp.snippet(),
        });
        match self.sink.lock() {
            Ok(mut f) => {
                if let Err(e) = writeln!(f, "{line}") {
                    warn!("failed to write transcript for {}: {e}", resp.url());
                }
            }
            Err(e) => warn!("failed to lock transcript for {}: {e}", resp.url()),
        }
    }

    pub(super) fn flush(&self) {
        match self.sink.lock() {
            Ok(mut f) => {
                if let Err(e) = f.flush() {
                    warn!("failed to flush transcript: {e}");
                }
            }
            Err(e) => warn!("failed to lock transcript for flush: {e}"),
        }
    }
}
