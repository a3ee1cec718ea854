//! Error types for bounded calls and races.
//!
//! [`CallError`] classifies why a single call produced no usable payload.
//! [`RaceError`] is the aggregate failure of a race in which no branch
//! produced one.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`CallError`].
pub type CallResult<T> = Result<T, CallError>;

/// Failure of a single deadline-bounded call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The connection could not be made or broke mid-flight.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The effective deadline of the call scope elapsed.
    #[error("timeout: deadline exceeded after {}ms", budget.as_millis())]
    Timeout {
        /// Time the scope allowed before expiring.
        budget: Duration,
    },

    /// The parent scope was cancelled while the call was in flight.
    #[error("call cancelled")]
    Cancelled,

    /// The remote answered with a non-success status.
    #[error("unexpected status code: {status}")]
    Protocol {
        /// HTTP status code returned by the remote.
        status: u16,
    },

    /// The body arrived but could not be decoded.
    #[error("decode error: {message}")]
    Decode {
        /// Error message.
        message: String,
    },

    /// The task running the call ended without reporting (e.g. it panicked).
    #[error("call aborted: {message}")]
    Aborted {
        /// Error message.
        message: String,
    },
}

impl CallError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an aborted error.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }

    /// Returns `true` for deadline expiry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Short, stable name of the error kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Protocol { .. } => "protocol",
            Self::Decode { .. } => "decode",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Aggregate failure of a race.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    /// No branch produced usable data.
    #[error("no winners: all {} branches failed", failures.len())]
    NoWinner {
        /// Each branch label with the reason it failed, in declaration order.
        failures: Vec<(String, CallError)>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_mentions_timeout() {
        let err = CallError::Timeout {
            budget: Duration::from_millis(200),
        };
        let msg = err.to_string();
        assert!(msg.contains("timeout"));
        assert!(msg.contains("200ms"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CallError::transport("x").kind(), "transport");
        assert_eq!(CallError::decode("x").kind(), "decode");
        assert_eq!(CallError::aborted("x").kind(), "aborted");
        assert_eq!(CallError::Cancelled.kind(), "cancelled");
        assert_eq!(CallError::Protocol { status: 503 }.kind(), "protocol");
    }

    #[test]
    fn test_protocol_display_carries_status() {
        let err = CallError::Protocol { status: 503 };
        assert_eq!(err.to_string(), "unexpected status code: 503");
    }

    #[test]
    fn test_no_winner_display() {
        let err = RaceError::NoWinner {
            failures: vec![
                ("a".to_string(), CallError::Cancelled),
                ("b".to_string(), CallError::transport("refused")),
            ],
        };
        assert_eq!(err.to_string(), "no winners: all 2 branches failed");
    }
}
