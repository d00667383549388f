//! Webhook endpoint handler.
//!
//! Validates a GitHub delivery, classifies it, and then forwards it,
//! suppresses it, or rejects it. This is the only place that turns routing
//! errors into HTTP responses.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use routing::{ClassifyError, LookupError, Target};
use thiserror::Error;
use tracing::{debug, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::forward::{ForwardError, ForwardRequest};
use crate::signature::verify_signature;
use crate::AppState;

/// Header name for the GitHub event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header name for the GitHub delivery id.
pub const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for the GitHub signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// `User-Agent` prefix GitHub uses for webhook deliveries.
const HOOKSHOT_AGENT_PREFIX: &str = "GitHub-Hookshot";

const HEADER_UPSTREAM_STATUS: &str = "x-middleware-github-status";
const HEADER_UPSTREAM_MESSAGE: &str = "x-middleware-github-message";
const HEADER_ERROR: &str = "x-middleware-error";
const HEADER_ERROR_MESSAGE: &str = "x-middleware-error-message";
const PAYLOAD_ERROR_KIND: &str = "PayloadError";
const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RATE_RESET: &str = "x-ratelimit-reset";

/// Reasons a delivery is not forwarded.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A secret is configured and the signature is missing or wrong.
    #[error("invalid signature")]
    InvalidSignature,

    /// The request does not come from GitHub's webhook sender.
    #[error("Not a github event")]
    NotGitHubEvent,

    /// The lookup against GitHub failed with something other than "not found".
    #[error("An error occurred in an upstream fetch request: {0}")]
    Upstream(LookupError),

    /// The payload of a checked event could not be decoded.
    #[error("An unexpected error occurred while processing the event")]
    Payload(#[source] ClassifyError),

    /// Neither the target's endpoint nor the monorepo endpoint is configured.
    #[error("Cannot process request due to missing server side keys")]
    MissingEndpoint,

    /// The notification endpoint could not be reached.
    #[error("Failed to forward the event: {0}")]
    Forward(#[from] ForwardError),
}

impl WebhookError {
    /// HTTP status this error is answered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::NotGitHubEvent => StatusCode::BAD_REQUEST,
            WebhookError::Upstream(LookupError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            WebhookError::Upstream(_) | WebhookError::Payload(_) | WebhookError::MissingEndpoint => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::Forward(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn diagnostic_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self {
            WebhookError::Upstream(err) => {
                if let Some(status) = err.status() {
                    insert_lossy(&mut headers, HEADER_UPSTREAM_STATUS, &status.to_string());
                }
                insert_lossy(&mut headers, HEADER_UPSTREAM_MESSAGE, err.message());
                if let LookupError::RateLimited { rate_limit, .. } = err {
                    let pairs = [
                        (HEADER_RATE_LIMIT, &rate_limit.limit),
                        (HEADER_RATE_REMAINING, &rate_limit.remaining),
                        (HEADER_RATE_RESET, &rate_limit.reset),
                    ];
                    for (name, value) in pairs {
                        if let Some(value) = value {
                            insert_lossy(&mut headers, name, value);
                        }
                    }
                    if let Some(wait) = rate_limit.retry_after(Utc::now()) {
                        headers.insert(RETRY_AFTER, HeaderValue::from(wait.as_secs()));
                    }
                }
            }
            WebhookError::Payload(err) => {
                insert_lossy(&mut headers, HEADER_ERROR, PAYLOAD_ERROR_KIND);
                insert_lossy(&mut headers, HEADER_ERROR_MESSAGE, &err.to_string());
            }
            _ => {}
        }
        headers
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status_code(), self.diagnostic_headers(), self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `User-Agent`: must start with `GitHub-Hookshot`
///   - `X-GitHub-Event`: event name (e.g. "push", "pull_request")
///   - `X-Hub-Signature-256`: only when a webhook secret is configured
/// - Body: JSON webhook payload
///
/// # Response
///
/// - Upstream status and body: the event was forwarded
/// - 204 No Content: the event was suppressed
/// - 400 Bad Request: not a GitHub webhook delivery
/// - 401 Unauthorized: bad signature
/// - 429 Too Many Requests: GitHub rate-limited the changed-file lookup
/// - 500 Internal Server Error: lookup failure, malformed payload, or no endpoint
/// - 502 Bad Gateway: the notification endpoint was unreachable
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery_id = header_str(&headers, HEADER_DELIVERY)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = info_span!(
        "webhook",
        delivery_id = %delivery_id,
        event = field::Empty,
        routed_to = field::Empty,
    );

    match handle(&state, &headers, body).instrument(span).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn handle(state: &AppState, headers: &HeaderMap, body: Bytes) -> Result<Response, WebhookError> {
    if let Some(secret) = state.webhook_secret() {
        let signature = header_str(headers, HEADER_SIGNATURE).unwrap_or_default();
        if !verify_signature(&body, signature, secret) {
            warn!("Invalid webhook signature");
            return Err(WebhookError::InvalidSignature);
        }
    }

    let event = github_event(headers)?;
    Span::current().record("event", event);

    let target = match state.dispatcher().classify_named(event, &body).await {
        Ok(target) => target,
        Err(ClassifyError::Lookup(LookupError::NotFound { message })) => {
            info!(reason = %message, "Changed files not found, routing to monorepo");
            Target::Monorepo
        }
        Err(ClassifyError::Lookup(err)) => {
            let reset_at = match &err {
                LookupError::RateLimited { rate_limit, .. } => rate_limit.reset_at(),
                _ => None,
            };
            warn!(error = %err, reset_at = ?reset_at, "Changed-file lookup failed");
            return Err(WebhookError::Upstream(err));
        }
        Err(err @ ClassifyError::Payload { .. }) => {
            warn!(error = %err, "Malformed webhook payload");
            return Err(WebhookError::Payload(err));
        }
    };
    Span::current().record("routed_to", field::display(&target));

    if target.is_suppressed() {
        info!("Event received, skipped forwarding");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let endpoints = state.endpoints();
    if let Target::Package(id) = &target {
        if endpoints.package(id).is_none() {
            debug!(package = %id, "No endpoint for package, using monorepo endpoint");
        }
    }
    let Some(endpoint) = endpoints.endpoint_for(&target) else {
        warn!("No endpoint configured for target");
        return Err(WebhookError::MissingEndpoint);
    };

    let request = ForwardRequest::from_inbound(headers, body);
    let response = state.forwarder().forward(endpoint, request).await.map_err(|e| {
        warn!(error = %e, "Forwarding failed");
        WebhookError::from(e)
    })?;

    info!(status = response.status.as_u16(), "Event forwarded");
    Ok(response.into_response())
}

/// Returns the event name of a genuine GitHub delivery.
fn github_event(headers: &HeaderMap) -> Result<&str, WebhookError> {
    let from_hookshot = header_str(headers, "user-agent")
        .is_some_and(|ua| ua.starts_with(HOOKSHOT_AGENT_PREFIX));
    match header_str(headers, HEADER_EVENT) {
        Some(event) if from_hookshot && !event.is_empty() => Ok(event),
        _ => Err(WebhookError::NotGitHubEvent),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Inserts a diagnostic header, dropping characters a header cannot carry.
fn insert_lossy(headers: &mut HeaderMap, name: &'static str, value: &str) {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();
    if let Ok(value) = HeaderValue::from_str(&cleaned) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routing::RateLimitInfo;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn hookshot_delivery_yields_event_name() {
        let map = headers(&[("user-agent", "GitHub-Hookshot/7e2c1f"), (HEADER_EVENT, "push")]);
        assert_eq!(github_event(&map).unwrap(), "push");
    }

    #[test]
    fn other_user_agents_are_rejected() {
        let map = headers(&[("user-agent", "curl/8.5.0"), (HEADER_EVENT, "push")]);
        assert!(matches!(github_event(&map), Err(WebhookError::NotGitHubEvent)));
    }

    #[test]
    fn missing_event_header_is_rejected() {
        let map = headers(&[("user-agent", "GitHub-Hookshot/7e2c1f")]);
        assert!(matches!(github_event(&map), Err(WebhookError::NotGitHubEvent)));
    }

    #[test]
    fn lossy_insert_strips_non_ascii() {
        let mut map = HeaderMap::new();
        insert_lossy(&mut map, HEADER_UPSTREAM_MESSAGE, "rate limit \u{2026} retry\nlater");
        assert_eq!(
            map.get(HEADER_UPSTREAM_MESSAGE).unwrap(),
            "rate limit  retrylater"
        );
    }

    #[test]
    fn payload_error_names_cause_once() {
        let cause = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let err = WebhookError::Payload(ClassifyError::Payload {
            category: "release",
            source: cause,
        });

        assert_eq!(
            err.to_string(),
            "An unexpected error occurred while processing the event"
        );
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(source.starts_with("malformed release payload"));

        let headers = err.diagnostic_headers();
        assert_eq!(headers[HEADER_ERROR], PAYLOAD_ERROR_KIND);
        assert_eq!(headers[HEADER_ERROR_MESSAGE], source.as_str());
    }

    #[test]
    fn rate_limit_sets_retry_after_until_reset() {
        let reset = Utc::now().timestamp() + 120;
        let err = WebhookError::Upstream(LookupError::RateLimited {
            status: 429,
            message: "secondary rate limit".into(),
            rate_limit: RateLimitInfo {
                reset: Some(reset.to_string()),
                ..RateLimitInfo::default()
            },
        });

        let headers = err.diagnostic_headers();
        let wait: u64 = headers[RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!((100..=120).contains(&wait), "retry-after was {wait}");
        assert_eq!(headers[HEADER_RATE_RESET], reset.to_string().as_str());
        assert!(headers.get(HEADER_RATE_LIMIT).is_none());
    }

    #[test]
    fn status_codes_per_error() {
        let rate_limited = WebhookError::Upstream(LookupError::RateLimited {
            status: 403,
            message: "API rate limit exceeded".into(),
            rate_limit: Default::default(),
        });
        let transport = WebhookError::Upstream(LookupError::Transport {
            status: None,
            message: "timed out".into(),
        });

        assert_eq!(rate_limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(transport.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(WebhookError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(WebhookError::NotGitHubEvent.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WebhookError::MissingEndpoint.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
