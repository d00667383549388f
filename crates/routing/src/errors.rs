//! Error types for the routing domain.
//!
//! [`LookupError`] is the failure taxonomy of the [`crate::ChangeLookup`] port.
//! Resolvers and the dispatcher never catch it; it reaches the gateway
//! unchanged inside [`ClassifyError::Lookup`], and the gateway alone decides
//! how each kind is answered.
//!
//! [`RegistryError`] covers invalid package tables, which are rejected when the
//! registry is built so classification itself has no failure modes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RateLimitInfo;

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

/// Failure of a changed-file lookup against the source-control provider.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LookupError {
    /// The commit, pull request, or repository does not resolve.
    #[error("lookup target not found: {message}")]
    NotFound {
        /// Provider message, or a description of what was looked up.
        message: String,
    },

    /// The provider refused the request because a rate limit was hit.
    #[error("rate limited by provider (HTTP {status}): {message}")]
    RateLimited {
        /// HTTP status returned (429, or 403 for primary rate limits).
        status: u16,
        /// Provider message.
        message: String,
        /// Rate-limit headers, when the provider sent them.
        rate_limit: RateLimitInfo,
    },

    /// Any other failure: network errors, timeouts, unexpected statuses, or
    /// malformed response bodies.
    #[error("{}", transport_message(.status, .message))]
    Transport {
        /// HTTP status, when a response was received at all.
        status: Option<u16>,
        /// Human-readable description.
        message: String,
    },
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("provider request failed (HTTP {code}): {message}"),
        None => format!("provider request failed: {message}"),
    }
}

impl LookupError {
    /// Returns the HTTP status associated with this failure, if known.
    pub fn status(&self) -> Option<u16> {
        match self {
            LookupError::NotFound { .. } => Some(404),
            LookupError::RateLimited { status, .. } => Some(*status),
            LookupError::Transport { status, .. } => *status,
        }
    }

    /// Returns the provider message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            LookupError::NotFound { message }
            | LookupError::RateLimited { message, .. }
            | LookupError::Transport { message, .. } => message,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification errors
// ---------------------------------------------------------------------------

/// Why a classification call did not produce a [`crate::Target`].
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The external lookup failed. Propagated verbatim.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The payload of a checked event category could not be decoded.
    #[error("malformed {category} payload: {source}")]
    Payload {
        /// Event name the payload was delivered under.
        category: &'static str,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// A package table that cannot be turned into a [`crate::PackageRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A package id, path prefix, or tag token was empty.
    #[error("package entry #{index} has an empty {field}")]
    EmptyField {
        /// Position of the entry in the table.
        index: usize,
        /// Name of the empty field.
        field: &'static str,
    },

    /// The same package id appears twice.
    #[error("package '{0}' is registered more than once")]
    DuplicatePackage(String),

    /// Two packages share a tag token, so tag parsing would be ambiguous.
    #[error("tag token '{0}' is used by more than one package")]
    DuplicateTagToken(String),

    /// The designated primary package is not in the table.
    #[error("primary package '{0}' is not registered")]
    UnknownPrimary(String),
}
