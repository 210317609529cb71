//! Operator-facing reports for submissions that did not succeed.

use std::fmt;
use std::sync::{Arc, Mutex};

use calltrace_primitives::{LogRecord, SESSION_ID_HEADER, SESSION_PATH_HEADER};
use tracing::warn;

use crate::LoggerError;

/// Category of a failed submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// The record could not be encoded.
    Encode,
    /// Network, DNS, connect, or deadline failure.
    Transport,
    /// The endpoint answered with a non-success status.
    Rejected,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Encode => "encode",
            Self::Transport => "transport",
            Self::Rejected => "rejected",
        })
    }
}

/// Report describing one suppressed submission failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    message: String,
    status: Option<u16>,
    session_id: Option<String>,
    session_path: Option<String>,
}

impl Diagnostic {
    /// Builds a diagnostic for `error`, tagged with the record's correlation entries.
    #[must_use]
    pub fn from_error(error: &LoggerError, record: &LogRecord) -> Self {
        let (kind, status) = match error {
            LoggerError::Encode { .. } => (DiagnosticKind::Encode, None),
            // Configuration errors are raised at construction, never by a submission.
            LoggerError::Transport { .. } | LoggerError::Configuration { .. } => {
                (DiagnosticKind::Transport, None)
            }
            LoggerError::Rejected { status, .. } => (DiagnosticKind::Rejected, Some(*status)),
        };
        let meta = record.provider_request().meta();
        Self {
            kind,
            message: error.to_string(),
            status,
            session_id: meta.get(SESSION_ID_HEADER).cloned(),
            session_path: meta.get(SESSION_PATH_HEADER).cloned(),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Returns the rendered error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the endpoint status for rejections.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the session id of the record, if it carried one.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns the session path of the record, if it carried one.
    #[must_use]
    pub fn session_path(&self) -> Option<&str> {
        self.session_path.as_deref()
    }
}

/// Destination for diagnostics produced by the logger.
pub trait DiagnosticSink: Send + Sync {
    /// Records a diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that emits diagnostics as `tracing` warnings.
#[derive(Debug, Default)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!(
            kind = %diagnostic.kind(),
            status = ?diagnostic.status(),
            session_id = diagnostic.session_id().unwrap_or_default(),
            session_path = diagnostic.session_path().unwrap_or_default(),
            error = diagnostic.message(),
            "failed to submit log record"
        );
    }
}

/// Sink that keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns the collected diagnostics.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn drain(&self) -> Vec<Diagnostic> {
        let mut lock = self.diagnostics.lock().expect("collecting sink poisoned");
        lock.drain(..).collect()
    }

    /// Returns the number of diagnostics currently held.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics
            .lock()
            .expect("collecting sink poisoned")
            .len()
    }

    /// Returns `true` when no diagnostics are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .expect("collecting sink poisoned")
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calltrace_primitives::{
        Correlation, ManualClock, RequestDescriptor, ResponseDescriptor, SessionId, SessionPath,
        TimingEnvelope,
    };
    use serde_json::json;

    fn record(session: SessionId) -> LogRecord {
        let clock = ManualClock::new(10_000);
        let timing = TimingEnvelope::start_with(&clock);
        clock.set(10_250);
        let correlation = Correlation::new(
            session,
            SessionPath::new("/visa-calculator").unwrap(),
            "VisaCalculation",
        );
        LogRecord::new(
            RequestDescriptor::new("https://api.openai.com/v1/assistants", json!({}))
                .with_correlation(&correlation),
            ResponseDescriptor::new(200, json!({})),
            timing.finalize_with(&clock),
        )
        .unwrap()
    }

    #[test]
    fn rejection_carries_status_and_session() {
        let session = SessionId::random();
        let err = LoggerError::Rejected {
            status: 503,
            body: "unavailable".to_owned(),
        };
        let diagnostic = Diagnostic::from_error(&err, &record(session));
        assert_eq!(diagnostic.kind(), DiagnosticKind::Rejected);
        assert_eq!(diagnostic.status(), Some(503));
        assert_eq!(diagnostic.session_id(), Some(session.to_string().as_str()));
        assert_eq!(diagnostic.session_path(), Some("/visa-calculator"));
        assert!(diagnostic.message().contains("503"));
    }

    #[test]
    fn kinds_cover_submission_failures() {
        let rendered: Vec<String> = [
            DiagnosticKind::Encode,
            DiagnosticKind::Transport,
            DiagnosticKind::Rejected,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(rendered, ["encode", "transport", "rejected"]);
    }

    #[test]
    fn collecting_sink_drains() {
        let sink = CollectingSink::new();
        let err = LoggerError::transport("connection refused");
        sink.report(Diagnostic::from_error(&err, &record(SessionId::random())));
        assert_eq!(sink.len(), 1);

        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].kind(), DiagnosticKind::Transport);
        assert_eq!(drained[0].status(), None);
        assert!(sink.is_empty());
    }
}
