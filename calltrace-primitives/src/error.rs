//! Shared error definitions for calltrace primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the calltrace crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building primitive values.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided session identifier could not be parsed.
    #[error("invalid session id: {source}")]
    InvalidSessionId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Session path failed validation.
    #[error("invalid session path `{path}`: {reason}")]
    InvalidSessionPath {
        /// The offending path string.
        path: String,
        /// Human-readable reason for rejection.
        reason: &'static str,
    },

    /// A timestamp carried a millisecond remainder outside `0..1000`.
    #[error("timestamp milliseconds must be below 1000, got {milliseconds}")]
    InvalidTimestamp {
        /// The rejected remainder.
        milliseconds: u16,
    },

    /// A log record was assembled from a timing envelope that was never finalized.
    #[error("timing envelope has not been finalized")]
    UnfinalizedTiming,
}
