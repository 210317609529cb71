//! Best-effort delivery of log records to a telemetry endpoint.
//!
//! [`AsyncLogger::log`] never returns an error: transport failures and
//! rejections are reported to a [`DiagnosticSink`] instead, so telemetry can
//! not perturb the call it describes.

#![warn(missing_docs, clippy::pedantic)]

pub mod config;
pub mod diagnostics;
pub mod transport;

mod error;
mod http_client;
mod logger;

pub use config::LoggerConfig;
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingDiagnosticSink,
};
pub use error::{LoggerError, LoggerResult};
pub use logger::AsyncLogger;
pub use transport::{HyperTransport, LogTransport, TransportRequest, TransportResponse};
