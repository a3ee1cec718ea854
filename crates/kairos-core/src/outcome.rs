//! Terminal record of one call execution.

use std::time::Duration;

use crate::error::{CallError, CallResult};

/// What a single call produced, and how long it took.
///
/// Exactly one outcome exists per execution; a timeout or cancellation is a
/// failed outcome, never a missing one.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome<T> {
    label: String,
    elapsed: Duration,
    result: CallResult<T>,
}

impl<T> CallOutcome<T> {
    /// Creates an outcome.
    pub fn new(label: impl Into<String>, elapsed: Duration, result: CallResult<T>) -> Self {
        Self {
            label: label.into(),
            elapsed,
            result,
        }
    }

    /// Label of the call that produced this outcome.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wall-clock time measured from just before the call was issued.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns `true` if the call produced a decoded payload.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The decoded payload, present only on success.
    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// The failure detail, present only on failure.
    #[must_use]
    pub fn error(&self) -> Option<&CallError> {
        self.result.as_ref().err()
    }

    /// Consumes the outcome, returning the result.
    pub fn into_result(self) -> CallResult<T> {
        self.result
    }

    /// Consumes the outcome, returning its label, elapsed time and result.
    pub fn into_parts(self) -> (String, Duration, CallResult<T>) {
        (self.label, self.elapsed, self.result)
    }

    /// Consumes the outcome, returning the payload if any.
    pub fn into_payload(self) -> Option<T> {
        self.result.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_outcome() {
        let outcome = CallOutcome::new("a", Duration::from_millis(5), Ok(3));
        assert!(outcome.is_success());
        assert_eq!(outcome.payload(), Some(&3));
        assert!(outcome.error().is_none());
        assert_eq!(outcome.label(), "a");
    }

    #[test]
    fn test_failed_outcome() {
        let outcome: CallOutcome<i32> =
            CallOutcome::new("b", Duration::from_millis(5), Err(CallError::Cancelled));
        assert!(!outcome.is_success());
        assert!(outcome.payload().is_none());
        assert_eq!(outcome.error(), Some(&CallError::Cancelled));
        assert_eq!(outcome.into_payload(), None);
    }
}
