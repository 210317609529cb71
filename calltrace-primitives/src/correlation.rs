//! Session correlation metadata.
//!
//! The telemetry backend groups calls into sessions using three opaque values:
//! a session id, a hierarchical path, and a human-readable session name. They
//! travel as string entries in both the request `meta` and the response
//! `headers` of every log record.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, SessionId};

/// Entry carrying the session identifier.
pub const SESSION_ID_HEADER: &str = "Helicone-Session-Id";
/// Entry carrying the hierarchical session path.
pub const SESSION_PATH_HEADER: &str = "Helicone-Session-Path";
/// Entry carrying the session name.
pub const SESSION_NAME_HEADER: &str = "Helicone-Session-Name";

/// Slash-separated path locating a call within a session tree, e.g.
/// `/visa-calculator/cost-calculation`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionPath(String);

impl SessionPath {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    /// Validates and wraps a path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSessionPath`] when the path does not start with
    /// `/`, contains whitespace, or contains empty segments.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(invalid(path, "path must start with `/`"));
        }
        if path.chars().any(char::is_whitespace) {
            return Err(invalid(path, "path must not contain whitespace"));
        }
        if path != "/" && path[1..].split('/').any(str::is_empty) {
            return Err(invalid(path, "path must not contain empty segments"));
        }
        Ok(Self(path))
    }

    /// Returns a new path with `segment` appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSessionPath`] when the segment is empty or
    /// contains `/` or whitespace.
    pub fn child(&self, segment: &str) -> Result<Self> {
        if segment.is_empty() || segment.contains('/') {
            return Err(invalid(
                segment.to_owned(),
                "segment must be non-empty and must not contain `/`",
            ));
        }
        if self.0 == "/" {
            Self::new(format!("/{segment}"))
        } else {
            Self::new(format!("{}/{segment}", self.0))
        }
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid(path: String, reason: &'static str) -> Error {
    Error::InvalidSessionPath { path, reason }
}

impl Display for SessionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SessionPath> for String {
    fn from(value: SessionPath) -> Self {
        value.0
    }
}

/// Identifiers grouping one call with the rest of its session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    session_id: SessionId,
    path: SessionPath,
    name: String,
}

impl Correlation {
    /// Creates correlation metadata for a session.
    #[must_use]
    pub fn new(session_id: SessionId, path: SessionPath, name: impl Into<String>) -> Self {
        Self {
            session_id,
            path,
            name: name.into(),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the session path.
    #[must_use]
    pub fn path(&self) -> &SessionPath {
        &self.path
    }

    /// Returns the session name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a copy located at `path` within the same session.
    #[must_use]
    pub fn at(&self, path: SessionPath) -> Self {
        Self {
            session_id: self.session_id,
            path,
            name: self.name.clone(),
        }
    }

    /// Renders the three correlation entries.
    #[must_use]
    pub fn to_headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (SESSION_ID_HEADER.to_owned(), self.session_id.to_string()),
            (SESSION_PATH_HEADER.to_owned(), self.path.to_string()),
            (SESSION_NAME_HEADER.to_owned(), self.name.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_paths() {
        assert!(SessionPath::new("/visa-calculator").is_ok());
        assert!(SessionPath::new("/").is_ok());

        for bad in ["visa", "/a//b", "/a/", "/a b", ""] {
            let err = SessionPath::new(bad).expect_err("path should be rejected");
            assert!(matches!(err, Error::InvalidSessionPath { .. }), "{bad}");
        }
    }

    #[test]
    fn child_extends_path() {
        let root = SessionPath::root();
        let calc = root.child("visa-calculator").unwrap();
        assert_eq!(calc.as_str(), "/visa-calculator");

        let result = calc
            .child("cost-calculation")
            .and_then(|path| path.child("result"))
            .unwrap();
        assert_eq!(result.as_str(), "/visa-calculator/cost-calculation/result");

        assert!(calc.child("a/b").is_err());
        assert!(calc.child("").is_err());
    }

    #[test]
    fn path_deserialization_validates() {
        let ok: SessionPath = serde_json::from_str("\"/a/b\"").unwrap();
        assert_eq!(ok.as_str(), "/a/b");
        assert!(serde_json::from_str::<SessionPath>("\"a/b\"").is_err());
    }

    #[test]
    fn renders_correlation_headers() {
        let id = SessionId::random();
        let correlation = Correlation::new(
            id,
            SessionPath::new("/visa-calculator").unwrap(),
            "VisaCalculation",
        );
        let headers = correlation.to_headers();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[SESSION_ID_HEADER], id.to_string());
        assert_eq!(headers[SESSION_PATH_HEADER], "/visa-calculator");
        assert_eq!(headers[SESSION_NAME_HEADER], "VisaCalculation");

        let moved = correlation.at(SessionPath::new("/other").unwrap());
        assert_eq!(moved.session_id(), id);
        assert_eq!(moved.path().as_str(), "/other");
        assert_eq!(moved.name(), "VisaCalculation");
    }
}
