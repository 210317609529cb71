//! Core shared types for instrumenting provider calls.
//!
//! Everything here is a plain value: timing envelopes bracketing an operation,
//! the request/response descriptors submitted to the telemetry backend, and the
//! correlation identifiers that group calls into sessions.

#![warn(missing_docs, clippy::pedantic)]

mod correlation;
mod error;
mod ids;
mod record;
mod timing;

/// Session correlation metadata threaded into request and response descriptors.
pub use correlation::{
    Correlation, SESSION_ID_HEADER, SESSION_NAME_HEADER, SESSION_PATH_HEADER, SessionPath,
};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Unique identifier for an instrumented session.
pub use ids::SessionId;
/// Wire-level log record and its descriptors.
pub use record::{LogRecord, RequestDescriptor, ResponseDescriptor};
/// Timing capture primitives.
pub use timing::{
    Clock, ManualClock, SystemClock, Timestamp, TimingEnvelope, finalize_timing, start_timing,
};
