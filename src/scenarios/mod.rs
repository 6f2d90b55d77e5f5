//! Scenario procedures asserting behaviours of the remote APIs.
//!
//! Each scenario takes its request context explicitly and returns `Ok` or the
//! first failed expectation. Whether contexts are shared between scenarios is
//! up to the caller.

pub mod catalog;
pub mod rate_limit;

use crate::error::{BoxedStr, HarnessError};

/// Fail with [`HarnessError::Assertion`] unless `cond` holds.
pub(crate) fn ensure(cond: bool, message: impl FnOnce() -> String) -> Result<(), HarnessError> {
    if cond {
        Ok(())
    } else {
        Err(HarnessError::Assertion(message().boxed()))
    }
}

#[cfg(test)]
mod tests {
    use super::ensure;

    #[test]
    fn ensure_reports_message_only_on_failure() {
        assert!(ensure(true, || unreachable!("message is lazy")).is_ok());
        let err = ensure(false, || "status was 404".into()).expect_err("fails");
        assert_eq!(err.to_string(), "assertion failed: status was 404");
    }
}
