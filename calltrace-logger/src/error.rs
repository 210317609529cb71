//! Error types for log submission.
//!
//! These never reach callers of [`AsyncLogger::log`](crate::AsyncLogger::log);
//! they surface only from construction and as [`Diagnostic`](crate::Diagnostic)s.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Result alias used by the logger.
pub type LoggerResult<T> = Result<T, LoggerError>;

/// Errors raised while configuring the logger or submitting a record.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Logger is misconfigured or missing credentials.
    #[error("logger not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// The record could not be encoded as JSON.
    #[error("failed to encode log record: {source}")]
    Encode {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },

    /// Transport-level failure (DNS, connect, timeout, protocol).
    #[error("log transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The telemetry endpoint answered with a non-success status.
    #[error("telemetry endpoint returned {status}: {body}")]
    Rejected {
        /// HTTP status returned by the endpoint.
        status: u16,
        /// Leading part of the response body.
        body: String,
    },
}

impl LoggerError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}
