//! Async request/response instrumentation for third-party API calls.
//!
//! Depend on this crate via `cargo add calltrace`. It bundles the workspace
//! crates behind feature flags so callers that only need the record types can
//! leave the HTTP stack out.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use calltrace_primitives as primitives;

/// Best-effort log submission (enabled by `logger` feature).
#[cfg(feature = "logger")]
pub use calltrace_logger as logger;

/// Session-scoped call instrumentation (enabled by `session` feature).
#[cfg(feature = "session")]
pub use calltrace_session as session;

pub use calltrace_primitives::{
    LogRecord, RequestDescriptor, ResponseDescriptor, TimingEnvelope, finalize_timing,
    start_timing,
};

#[cfg(feature = "logger")]
pub use calltrace_logger::{AsyncLogger, LoggerConfig};
