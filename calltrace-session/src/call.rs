//! Descriptions of a wrapped provider call and of what it returned.

use calltrace_primitives::SessionPath;
use serde_json::Value;

/// Outbound request as it should appear in the log record.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderCall {
    url: String,
    json: Value,
    path: Option<SessionPath>,
}

impl ProviderCall {
    /// Describes a request to `url` carrying `json`.
    #[must_use]
    pub fn new(url: impl Into<String>, json: Value) -> Self {
        Self {
            url: url.into(),
            json,
            path: None,
        }
    }

    /// Records this call at `path` instead of the session's default path.
    #[must_use]
    pub fn at(mut self, path: SessionPath) -> Self {
        self.path = Some(path);
        self
    }

    /// Returns the request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request payload.
    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// Returns the per-call path override.
    #[must_use]
    pub fn path(&self) -> Option<&SessionPath> {
        self.path.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Value, Option<SessionPath>) {
        (self.url, self.json, self.path)
    }
}

/// Result of a completed provider call plus the response metadata to log.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderReply<T> {
    value: T,
    status: u16,
    json: Value,
}

impl<T> ProviderReply<T> {
    /// Wraps the call's `value` with its HTTP `status` and a loggable `json` summary.
    #[must_use]
    pub fn new(value: T, status: u16, json: Value) -> Self {
        Self {
            value,
            status,
            json,
        }
    }

    /// Returns the call's result.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the HTTP status reported by the provider.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns the response summary.
    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }

    pub(crate) fn into_parts(self) -> (T, u16, Value) {
        (self.value, self.status, self.json)
    }
}
