//! Delivery of classified events to their notification endpoint.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Client;
use thiserror::Error;

/// Inbound headers copied onto the forwarded request.
pub const FORWARDED_HEADERS: [&str; 7] = [
    "content-type",
    "user-agent",
    "x-github-event",
    "x-github-delivery",
    "x-github-hook-id",
    "x-github-hook-installation-target-id",
    "x-github-hook-installation-target-type",
];

/// Errors raised while forwarding an event.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The HTTP client could not be constructed.
    #[error("failed to build forwarding client: {0}")]
    Client(#[source] reqwest::Error),

    /// The endpoint could not be reached or did not answer in time.
    #[error("forwarding request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// An event ready to be re-posted.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Headers to send, already filtered to [`FORWARDED_HEADERS`].
    pub headers: HeaderMap,
    /// The inbound request body, byte for byte.
    pub body: Bytes,
}

impl ForwardRequest {
    /// Builds a request from the inbound delivery, keeping only the
    /// [`FORWARDED_HEADERS`].
    pub fn from_inbound(inbound: &HeaderMap, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        for name in FORWARDED_HEADERS {
            if let Some(value) = inbound.get(name) {
                headers.insert(HeaderName::from_static(name), value.clone());
            }
        }
        Self { headers, body }
    }
}

/// What the endpoint answered. Relayed to GitHub unchanged.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    /// Upstream status code.
    pub status: StatusCode,
    /// Upstream `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Upstream body.
    pub body: Bytes,
}

impl IntoResponse for ForwardResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Some(value) = self.content_type.and_then(|ct| ct.parse().ok()) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
    }
}

/// Delivers an event to a notification endpoint.
///
/// The gateway depends on this trait rather than on an HTTP client so tests can
/// record deliveries instead of making them.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Posts `request` to `endpoint` and returns the endpoint's answer.
    ///
    /// Any HTTP status counts as an answer; only failing to get one is an error.
    async fn forward(
        &self,
        endpoint: &str,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, ForwardError>;
}

/// [`Forwarder`] that re-posts events with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    http: Client,
}

impl HttpForwarder {
    /// Builds a forwarder whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ForwardError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ForwardError::Client)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        endpoint: &str,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, ForwardError> {
        // Endpoint URLs carry credentials; keep them out of error messages.
        let response = self
            .http
            .post(endpoint)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| ForwardError::Request(e.without_url()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::Request(e.without_url()))?;

        Ok(ForwardResponse {
            status,
            content_type,
            body,
        })
    }
}
