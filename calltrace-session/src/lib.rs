//! Instrumentation of provider calls within a correlated session.
//!
//! A [`Session`] runs the full sequence around each wrapped call: open a timing
//! envelope, await the call, close the envelope, and hand the resulting
//! [`LogRecord`](calltrace_primitives::LogRecord) to the logger.

#![warn(missing_docs, clippy::pedantic)]

mod call;
mod session;

pub use call::{ProviderCall, ProviderReply};
pub use session::{Delivery, Session};
