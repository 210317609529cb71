//! Transport seam between the logger and the network.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::body::to_bytes;
use hyper::{Body, HeaderMap, Request, StatusCode, Uri};

use crate::http_client::{HyperClient, build_https_client};
use crate::{LoggerError, LoggerResult};

/// Fully prepared POST submission.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    endpoint: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl TransportRequest {
    /// Creates a POST to `endpoint` with the given headers and body.
    #[must_use]
    pub fn new(endpoint: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            endpoint,
            headers,
            body,
        }
    }

    /// Returns the target endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the encoded body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Status and body returned by the endpoint.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    status: StatusCode,
    body: Bytes,
}

impl TransportResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Sends one prepared submission and reports what the endpoint answered.
///
/// Implementations return `Err` only for transport-level failures; a non-2xx
/// answer is still an `Ok` response.
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Performs the POST.
    async fn send(&self, request: TransportRequest) -> LoggerResult<TransportResponse>;
}

/// [`LogTransport`] backed by a pooled hyper client over rustls.
pub struct HyperTransport {
    client: HyperClient,
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    /// Builds a transport with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: build_https_client(),
        }
    }
}

#[async_trait]
impl LogTransport for HyperTransport {
    async fn send(&self, request: TransportRequest) -> LoggerResult<TransportResponse> {
        let TransportRequest {
            endpoint,
            headers,
            body,
        } = request;

        let mut builder = Request::post(endpoint);
        if let Some(target) = builder.headers_mut() {
            target.extend(headers);
        }
        let request = builder.body(Body::from(body)).map_err(|err| {
            LoggerError::transport(format!("failed to build log request: {err}"))
        })?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|err| LoggerError::transport(format!("log request failed: {err}")))?;

        let status = response.status();
        let body = to_bytes(response.into_body()).await.map_err(|err| {
            LoggerError::transport(format!("failed to read log response: {err}"))
        })?;

        Ok(TransportResponse::new(status, body))
    }
}
