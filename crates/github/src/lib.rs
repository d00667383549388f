//! Fanout GitHub infrastructure adapter.
//!
//! Implements the [`routing::ChangeLookup`] port over the GitHub REST API:
//!
//! - `commit_files` reads `GET /repos/{owner}/{repo}/commits/{ref}`.
//! - `pull_request_files` pages through `GET /repos/{owner}/{repo}/pulls/{n}/files`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain routing rules. Transport
//! details (authentication, pagination, status codes, rate-limit headers) are
//! handled here and reduced to [`routing::LookupError`] before they reach the
//! domain.

mod client;
mod error;

pub use client::{GitHubClient, GitHubClientConfig, DEFAULT_API_URL};
pub use error::GitHubClientError;
