//! Routing domain for Fanout.
//!
//! This crate decides where a webhook event from a monorepo should be
//! delivered: to one package's channel, to the catch-all monorepo channel, or
//! nowhere. Infrastructure crates implement the [`ChangeLookup`] port defined
//! here; they never add routing rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`PackageId`, `UserId`, `CommitRef`, etc.) |
//! | [`types`] | Routing outcome and provider metadata (`Target`, `RateLimitInfo`) |
//! | [`errors`] | Lookup, classification and registry errors |
//! | [`registry`] | The ordered package table |
//! | [`disambiguation`] | The shared "exactly one package" rule |
//! | [`suppression`] | Author-based discard rule |
//! | [`category`] | Checked webhook event kinds |
//! | [`payloads`] | Minimal typed webhook payloads |
//! | [`lookup`] | The `ChangeLookup` port |
//! | [`resolvers`] | One resolver per event category |
//! | [`dispatcher`] | Category-to-resolver selection |

pub mod category;
pub mod disambiguation;
pub mod dispatcher;
pub mod errors;
pub mod identifiers;
pub mod lookup;
pub mod payloads;
pub mod registry;
pub mod resolvers;
pub mod suppression;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use category::EventCategory;
pub use dispatcher::Dispatcher;
pub use errors::{ClassifyError, LookupError, RegistryError};
pub use identifiers::{CommitRef, PackageId, PullRequestNumber, RepositoryRef, UserId};
pub use lookup::ChangeLookup;
pub use registry::{PackageEntry, PackageRegistry, DEFAULT_LABEL_PREFIX};
pub use suppression::{SuppressionRule, CODECOV_BOT_ID, VERCEL_BOT_ID};
pub use types::{RateLimitInfo, Target};
