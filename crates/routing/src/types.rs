//! Shared value types for the routing domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the outcome of a classification or metadata reported by the source-control
//! provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PackageId;

// ---------------------------------------------------------------------------
// Routing target
// ---------------------------------------------------------------------------

/// The routing decision for one webhook event.
///
/// Exactly one [`Target`] is produced per classification. It is built fresh for
/// every event and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The event concerns exactly one package.
    Package(PackageId),
    /// The event is cross-cutting, ambiguous, or not attributable to any package.
    Monorepo,
    /// The event is discarded without forwarding.
    Suppressed,
}

impl Target {
    /// Returns `true` if the event should not be forwarded anywhere.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Target::Suppressed)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Package(id) => write!(f, "{id}"),
            Target::Monorepo => f.write_str("monorepo"),
            Target::Suppressed => f.write_str("none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rate limits
// ---------------------------------------------------------------------------

/// Rate-limit metadata reported alongside a rejected provider request.
///
/// Values are carried verbatim from the `x-ratelimit-limit`,
/// `x-ratelimit-remaining` and `x-ratelimit-reset` response headers so the
/// gateway can pass them through unchanged. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Requests permitted per window.
    pub limit: Option<String>,
    /// Requests left in the current window.
    pub remaining: Option<String>,
    /// Window reset time, in UTC epoch seconds.
    pub reset: Option<String>,
}

impl RateLimitInfo {
    /// Returns the reset time parsed as a UTC timestamp.
    ///
    /// `None` when the header is missing or not an integer epoch value.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.reset.as_deref()?.trim().parse().ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Time left until the window resets, as seen from `now`.
    ///
    /// Zero once the reset time has passed; `None` without a usable reset.
    pub fn retry_after(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let wait = self.reset_at()? - now;
        Some(wait.to_std().unwrap_or_default())
    }

    /// Returns `true` if the provider reported zero remaining requests.
    pub fn is_exhausted(&self) -> bool {
        self.remaining.as_deref().map(str::trim) == Some("0")
    }
}
