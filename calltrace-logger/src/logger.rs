//! Asynchronous, error-transparent log submission.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use calltrace_primitives::LogRecord;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use hyper::{HeaderMap, StatusCode, Uri};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnosticSink};
use crate::transport::{HyperTransport, LogTransport, TransportRequest};
use crate::{LoggerConfig, LoggerError, LoggerResult};

/// Longest slice of a rejection body kept in diagnostics.
const REJECTION_BODY_LIMIT: usize = 512;

const NO_RUNTIME: &str = "no tokio runtime is running; log record not submitted";

/// Submits [`LogRecord`]s to the telemetry endpoint, one attempt each.
///
/// Holds only immutable configuration and shared collaborators, so one
/// instance can serve any number of concurrent calls.
pub struct AsyncLogger {
    transport: Arc<dyn LogTransport>,
    sink: Arc<dyn DiagnosticSink>,
    endpoint: Uri,
    authorization: HeaderValue,
    timeout: Duration,
}

impl fmt::Debug for AsyncLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLogger")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AsyncLogger {
    /// Constructs a logger that submits over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Configuration`] if the API key is missing or
    /// blank, or cannot be carried in a header.
    pub fn new(config: LoggerConfig) -> LoggerResult<Self> {
        Self::with_transport(config, Arc::new(HyperTransport::new()))
    }

    /// Constructs a logger that submits through `transport`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`AsyncLogger::new`].
    #[allow(clippy::needless_pass_by_value)]
    pub fn with_transport(
        config: LoggerConfig,
        transport: Arc<dyn LogTransport>,
    ) -> LoggerResult<Self> {
        let api_key = config
            .api_key()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LoggerError::configuration("telemetry logger requires an API key"))?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|err| LoggerError::configuration(format!("invalid API key: {err}")))?;
        authorization.set_sensitive(true);

        let endpoint = config.endpoint().parse::<Uri>().map_err(|err| {
            LoggerError::configuration(format!("invalid log endpoint: {err}"))
        })?;

        Ok(Self {
            transport,
            sink: Arc::new(TracingDiagnosticSink),
            endpoint,
            authorization,
            timeout: config.timeout(),
        })
    }

    /// Routes diagnostics to `sink` instead of `tracing`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the submission endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Submits `record` and waits for the round trip to settle.
    ///
    /// Any failure is reported to the diagnostic sink; this call itself always
    /// completes normally.
    pub async fn log(&self, record: &LogRecord) {
        match self.submit(record).await {
            Ok(status) => debug!(
                status = status.as_u16(),
                url = record.provider_request().url(),
                "log record accepted"
            ),
            Err(err) => self.sink.report(Diagnostic::from_error(&err, record)),
        }
    }

    /// Submits `record` on a detached task of the current tokio runtime.
    ///
    /// Outside a runtime nothing is spawned: the record is reported to the
    /// diagnostic sink and `None` is returned.
    pub fn spawn_log(self: &Arc<Self>, record: LogRecord) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            let err = LoggerError::transport(NO_RUNTIME);
            self.sink.report(Diagnostic::from_error(&err, &record));
            return None;
        };
        let logger = Arc::clone(self);
        Some(runtime.spawn(async move { logger.log(&record).await }))
    }

    async fn submit(&self, record: &LogRecord) -> LoggerResult<StatusCode> {
        // The deadline timer and the hyper connector both need a runtime.
        if Handle::try_current().is_err() {
            return Err(LoggerError::transport(NO_RUNTIME));
        }

        let body = serde_json::to_vec(record)?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = TransportRequest::new(self.endpoint.clone(), headers, Bytes::from(body));

        let response = timeout(self.timeout, self.transport.send(request))
            .await
            .map_err(|_| {
                LoggerError::transport(format!(
                    "log submission timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })??;

        let status = response.status();
        if !status.is_success() {
            let body = String::from_utf8_lossy(response.body())
                .chars()
                .take(REJECTION_BODY_LIMIT)
                .collect();
            return Err(LoggerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(status)
    }
}
