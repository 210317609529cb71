//! Session-scoped call instrumentation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use calltrace_logger::AsyncLogger;
use calltrace_primitives::{
    Clock, Correlation, LogRecord, RequestDescriptor, ResponseDescriptor, SessionId, SessionPath,
    SystemClock, TimingEnvelope,
};
use tracing::{debug, warn};

use crate::{ProviderCall, ProviderReply};

/// How a finished call's record reaches the logger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Wait for the submission to settle before returning the call's value.
    #[default]
    Await,
    /// Submit on a detached tokio task and return immediately.
    ///
    /// Without a running tokio runtime the record is reported to the
    /// logger's diagnostic sink instead.
    Detached,
}

/// Correlated group of instrumented provider calls sharing one logger.
#[derive(Clone)]
pub struct Session {
    correlation: Correlation,
    logger: Arc<AsyncLogger>,
    delivery: Delivery,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("correlation", &self.correlation)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Starts a session with a fresh id, rooted at `path`.
    #[must_use]
    pub fn new(logger: Arc<AsyncLogger>, name: impl Into<String>, path: SessionPath) -> Self {
        Self::with_correlation(logger, Correlation::new(SessionId::random(), path, name))
    }

    /// Joins an existing session described by `correlation`.
    #[must_use]
    pub fn with_correlation(logger: Arc<AsyncLogger>, correlation: Correlation) -> Self {
        Self {
            correlation,
            logger,
            delivery: Delivery::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets how records are handed to the logger.
    #[must_use]
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Replaces the wall clock used for timing envelopes.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the session's correlation metadata.
    #[must_use]
    pub fn correlation(&self) -> &Correlation {
        &self.correlation
    }

    /// Returns a session for the same id whose default path gains `segment`.
    ///
    /// # Errors
    ///
    /// Returns [`calltrace_primitives::Error::InvalidSessionPath`] for an
    /// empty segment or one containing `/`.
    pub fn child(&self, segment: &str) -> calltrace_primitives::Result<Self> {
        let path = self.correlation.path().child(segment)?;
        Ok(Self {
            correlation: self.correlation.at(path),
            ..self.clone()
        })
    }

    /// Times `operation`, then logs it and returns its value.
    ///
    /// The record is only built once the operation completes successfully. An
    /// `Err` from the operation is returned unchanged and nothing is logged.
    /// Logging problems never change the returned value, including being
    /// driven by an executor other than tokio: the submission is then skipped
    /// and reported to the logger's diagnostic sink.
    ///
    /// # Errors
    ///
    /// Returns exactly the error produced by `operation`.
    pub async fn instrument<T, E, F, Fut>(&self, call: ProviderCall, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ProviderReply<T>, E>>,
    {
        let (url, json, path) = call.into_parts();
        let correlation = path.map_or_else(|| self.correlation.clone(), |p| self.correlation.at(p));

        let timing = TimingEnvelope::start_with(self.clock.as_ref());
        let reply = match operation().await {
            Ok(reply) => reply,
            Err(err) => {
                debug!(
                    url = %url,
                    session_path = %correlation.path(),
                    "provider call failed; no record submitted"
                );
                return Err(err);
            }
        };
        let timing = timing.finalize_with(self.clock.as_ref());

        let (value, status, response_json) = reply.into_parts();
        let request = RequestDescriptor::new(url, json).with_correlation(&correlation);
        let response =
            ResponseDescriptor::new(status, response_json).with_correlation(&correlation);

        match LogRecord::new(request, response, timing) {
            Ok(record) => self.deliver(record).await,
            Err(err) => warn!(
                error = %err,
                session_path = %correlation.path(),
                "skipping log record"
            ),
        }

        Ok(value)
    }

    async fn deliver(&self, record: LogRecord) {
        match self.delivery {
            Delivery::Await => self.logger.log(&record).await,
            Delivery::Detached => {
                self.logger.spawn_log(record);
            }
        }
    }
}
