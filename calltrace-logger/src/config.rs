//! Logger configuration.

use std::{env, fmt, time::Duration};

use hyper::Uri;

use crate::{LoggerError, LoggerResult};

/// Environment variable holding the telemetry API key.
pub const HELICONE_API_KEY_ENV: &str = "HELICONE_API_KEY";

/// Environment variable overriding the submission endpoint.
pub const HELICONE_LOG_ENDPOINT_ENV: &str = "HELICONE_LOG_ENDPOINT";

/// Endpoint records are submitted to unless overridden.
pub const DEFAULT_ENDPOINT: &str = "https://api.us.hconeai.com/custom/v1/log";

/// Deadline applied to each submission unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`AsyncLogger`](crate::AsyncLogger).
#[derive(Clone)]
pub struct LoggerConfig {
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LoggerConfig {
    /// Creates a configuration using the supplied API key and default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Loads the API key and optional endpoint override from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Configuration`] if `HELICONE_LOG_ENDPOINT` is set
    /// to an invalid URL.
    pub fn from_env() -> LoggerResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LoggerResult<Self> {
        let cfg = Self {
            api_key: lookup(HELICONE_API_KEY_ENV),
            ..Self::default()
        };
        match lookup(HELICONE_LOG_ENDPOINT_ENV) {
            Some(endpoint) if !endpoint.trim().is_empty() => cfg.with_endpoint(endpoint),
            _ => Ok(cfg),
        }
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the submission endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Configuration`] if the URL lacks an `http(s)://`
    /// scheme or does not parse.
    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> LoggerResult<Self> {
        self.endpoint = sanitize_endpoint(endpoint.as_ref())?;
        Ok(self)
    }

    /// Sets the deadline for each submission.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the API key, if one was supplied.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the submission endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the submission deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn sanitize_endpoint(input: &str) -> LoggerResult<String> {
    let endpoint = input.trim().to_owned();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(LoggerError::configuration(
            "log endpoint must start with http:// or https://",
        ));
    }
    endpoint
        .parse::<Uri>()
        .map_err(|err| LoggerError::configuration(format!("invalid log endpoint: {err}")))?;
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_helicone_endpoint() {
        let cfg = LoggerConfig::new("key");
        assert_eq!(cfg.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(cfg.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(cfg.api_key(), Some("key"));
    }

    #[test]
    fn endpoint_requires_scheme() {
        let err = LoggerConfig::new("key")
            .with_endpoint("api.us.hconeai.com/custom/v1/log")
            .expect_err("missing scheme should error");
        assert!(matches!(err, LoggerError::Configuration { .. }));
    }

    #[test]
    fn endpoint_is_trimmed() {
        let cfg = LoggerConfig::new("key")
            .with_endpoint("  http://127.0.0.1:8585/custom/v1/log ")
            .expect("valid URL");
        assert_eq!(cfg.endpoint(), "http://127.0.0.1:8585/custom/v1/log");
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[test]
    fn env_key_only_uses_default_endpoint() {
        let cfg = LoggerConfig::from_lookup(vars(&[(HELICONE_API_KEY_ENV, "sk-helicone")]))
            .unwrap();
        assert_eq!(cfg.api_key(), Some("sk-helicone"));
        assert_eq!(cfg.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn env_endpoint_override_and_blank_override() {
        let cfg = LoggerConfig::from_lookup(vars(&[
            (HELICONE_API_KEY_ENV, "sk-helicone"),
            (HELICONE_LOG_ENDPOINT_ENV, "http://127.0.0.1:8585/custom/v1/log"),
        ]))
        .unwrap();
        assert_eq!(cfg.endpoint(), "http://127.0.0.1:8585/custom/v1/log");

        let cfg = LoggerConfig::from_lookup(vars(&[(HELICONE_LOG_ENDPOINT_ENV, "   ")])).unwrap();
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn env_invalid_endpoint_is_rejected() {
        let err = LoggerConfig::from_lookup(vars(&[(HELICONE_LOG_ENDPOINT_ENV, "hconeai.com/log")]))
            .unwrap_err();
        assert!(matches!(err, LoggerError::Configuration { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = LoggerConfig::new("sk-helicone-secret");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-helicone-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
