//! Translation of GitHub API failures into [`LookupError`].
//!
//! The routing domain only distinguishes three failure kinds:
//!
//! - **NotFound**: HTTP 404. The commit or pull request does not resolve.
//! - **RateLimited**: HTTP 429, or HTTP 403 that GitHub marks as a rate limit
//!   (either `x-ratelimit-remaining: 0` or a rate-limit message).
//! - **Transport**: everything else, including network failures, timeouts and
//!   response bodies that do not decode.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use routing::{LookupError, RateLimitInfo};
use serde::Deserialize;
use thiserror::Error;

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";

/// Errors raised while constructing a [`crate::GitHubClient`].
#[derive(Debug, Error)]
pub enum GitHubClientError {
    /// The configured API base URL does not parse or cannot carry a path.
    #[error("invalid GitHub API URL '{url}': {reason}")]
    InvalidApiUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Error body returned by the GitHub REST API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Copies the `x-ratelimit-*` headers verbatim.
pub(crate) fn rate_limit_info(headers: &HeaderMap) -> RateLimitInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    RateLimitInfo {
        limit: header(HEADER_LIMIT),
        remaining: header(HEADER_REMAINING),
        reset: header(HEADER_RESET),
    }
}

/// Classifies a non-success response.
pub(crate) fn classify_failure(status: StatusCode, rate_limit: RateLimitInfo, body: &str) -> LookupError {
    let message = error_message(status, body);
    let code = status.as_u16();

    match status {
        StatusCode::NOT_FOUND => LookupError::NotFound { message },
        StatusCode::TOO_MANY_REQUESTS => LookupError::RateLimited {
            status: code,
            message,
            rate_limit,
        },
        StatusCode::FORBIDDEN if rate_limit.is_exhausted() || is_rate_limit_message(&message) => {
            LookupError::RateLimited {
                status: code,
                message,
                rate_limit,
            }
        }
        _ => LookupError::Transport {
            status: Some(code),
            message,
        },
    }
}

/// Classifies a failure that produced no usable response.
pub(crate) fn classify_transport(err: &reqwest::Error) -> LookupError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    LookupError::Transport {
        status: err.status().map(|s| s.as_u16()),
        message,
    }
}

/// Classifies a success response whose body could not be decoded.
pub(crate) fn malformed_body(status: StatusCode, err: &reqwest::Error) -> LookupError {
    LookupError::Transport {
        status: Some(status.as_u16()),
        message: format!("malformed response body: {err}"),
    }
}

/// Prefers GitHub's JSON `message`, then the raw body, then the reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_owned();
    }
    status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_owned()
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_message(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}
