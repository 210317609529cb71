//! Log record submitted to the telemetry backend for each instrumented call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Correlation, Error, Result, TimingEnvelope};

/// Description of the outbound provider request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    url: String,
    json: Value,
    #[serde(default)]
    meta: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Creates a descriptor for a request to `url` carrying `json`.
    #[must_use]
    pub fn new(url: impl Into<String>, json: Value) -> Self {
        Self {
            url: url.into(),
            json,
            meta: BTreeMap::new(),
        }
    }

    /// Adds a single metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Adds the session correlation entries to the metadata.
    #[must_use]
    pub fn with_correlation(mut self, correlation: &Correlation) -> Self {
        self.meta.extend(correlation.to_headers());
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

    /// Returns the metadata entries.
    #[must_use]
    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }
}

/// Description of the provider response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    json: Value,
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl ResponseDescriptor {
    /// Creates a descriptor for a response with the given HTTP status.
    #[must_use]
    pub fn new(status: u16, json: Value) -> Self {
        Self {
            json,
            status,
            headers: BTreeMap::new(),
        }
    }

    /// Adds a single header entry.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Adds the session correlation entries to the headers.
    #[must_use]
    pub fn with_correlation(mut self, correlation: &Correlation) -> Self {
        self.headers.extend(correlation.to_headers());
        self
    }

    /// Returns the response payload.
    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// Returns the HTTP status code reported by the provider.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns the header entries.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// One unit of telemetry: request, response, and timing of a provider call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    provider_request: RequestDescriptor,
    provider_response: ResponseDescriptor,
    timing: TimingEnvelope,
}

impl LogRecord {
    /// Assembles a record from a completed call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnfinalizedTiming`] if `timing` still carries the zero
    /// end sentinel.
    pub fn new(
        provider_request: RequestDescriptor,
        provider_response: ResponseDescriptor,
        timing: TimingEnvelope,
    ) -> Result<Self> {
        if !timing.is_finalized() {
            return Err(Error::UnfinalizedTiming);
        }
        Ok(Self {
            provider_request,
            provider_response,
            timing,
        })
    }

    /// Returns the request descriptor.
    #[must_use]
    pub fn provider_request(&self) -> &RequestDescriptor {
        &self.provider_request
    }

    /// Returns the response descriptor.
    #[must_use]
    pub fn provider_response(&self) -> &ResponseDescriptor {
        &self.provider_response
    }

    /// Returns the timing envelope.
    #[must_use]
    pub const fn timing(&self) -> &TimingEnvelope {
        &self.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, SessionId, SessionPath, Timestamp};
    use serde_json::json;

    fn finalized_timing() -> TimingEnvelope {
        let clock = ManualClock::new(1_000_500);
        let start = TimingEnvelope::start_with(&clock);
        clock.set(1_002_125);
        start.finalize_with(&clock)
    }

    #[test]
    fn rejects_unfinalized_timing() {
        let clock = ManualClock::new(1_000_500);
        let err = LogRecord::new(
            RequestDescriptor::new("https://api.openai.com/v1/assistants", json!({})),
            ResponseDescriptor::new(200, json!({})),
            TimingEnvelope::start_with(&clock),
        )
        .expect_err("unfinalized timing should be rejected");
        assert!(matches!(err, Error::UnfinalizedTiming));
    }

    #[test]
    fn rejects_timing_ended_at_epoch() {
        let clock = ManualClock::new(0);
        let timing = TimingEnvelope::start_with(&clock).finalize_with(&clock);
        let err = LogRecord::new(
            RequestDescriptor::new("https://api.openai.com/v1/assistants", json!({})),
            ResponseDescriptor::new(200, json!({})),
            timing,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnfinalizedTiming));
    }

    #[test]
    fn serializes_wire_shape() {
        let record = LogRecord::new(
            RequestDescriptor::new(
                "https://api.openai.com/v1/assistants",
                json!({"model": "gpt-4o-mini"}),
            )
            .with_meta("Helicone-Session-Name", "VisaCalculation"),
            ResponseDescriptor::new(201, json!({"call": "CreateAssistant"})),
            finalized_timing(),
        )
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "providerRequest": {
                    "url": "https://api.openai.com/v1/assistants",
                    "json": { "model": "gpt-4o-mini" },
                    "meta": { "Helicone-Session-Name": "VisaCalculation" }
                },
                "providerResponse": {
                    "json": { "call": "CreateAssistant" },
                    "status": 201,
                    "headers": {}
                },
                "timing": {
                    "startTime": { "seconds": 1000, "milliseconds": 500 },
                    "endTime": { "seconds": 1002, "milliseconds": 125 }
                }
            })
        );
    }

    #[test]
    fn wire_round_trip_preserves_arbitrary_payloads() {
        let payloads = [
            json!({}),
            json!([[1, [2, [3, []]]], {"nested": [{"deep": null}]}]),
            json!({"greeting": "héllo wörld ✈ 签证", "emoji": "🛂", "n": -1.5, "ok": true}),
            Value::Null,
        ];
        let correlation = Correlation::new(
            SessionId::random(),
            SessionPath::new("/visa-calculator/cost-calculation/result").unwrap(),
            "VisaCalculation",
        );

        for payload in payloads {
            let record = LogRecord::new(
                RequestDescriptor::new("https://api.openai.com/v1/threads/runs", payload.clone())
                    .with_correlation(&correlation),
                ResponseDescriptor::new(200, payload).with_correlation(&correlation),
                finalized_timing(),
            )
            .unwrap();

            let encoded = serde_json::to_string(&record).unwrap();
            let decoded: LogRecord = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, record);
        }
    }

    #[test]
    fn accessors_expose_parts() {
        let timing = finalized_timing();
        let record = LogRecord::new(
            RequestDescriptor::new("u", json!(1)),
            ResponseDescriptor::new(500, json!(2)).with_header("x", "y"),
            timing,
        )
        .unwrap();
        assert_eq!(record.provider_request().url(), "u");
        assert_eq!(record.provider_response().status(), 500);
        assert_eq!(record.provider_response().headers()["x"], "y");
        assert_eq!(record.timing().ended_at(), Timestamp::from_unix_millis(1_002_125));
    }
}
