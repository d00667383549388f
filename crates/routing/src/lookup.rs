//! Port for changed-file lookups against the source-control provider.
//!
//! The routing domain never performs I/O itself. Resolvers that need to know
//! which files a commit or pull request touched call through this trait; the
//! `github` crate supplies the production implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{CommitRef, LookupError, PullRequestNumber, RepositoryRef};

/// Read-only access to changed file paths.
///
/// Implementations must not retry internally in a way that hides the failure
/// kind: a rate-limited request surfaces as [`LookupError::RateLimited`], an
/// unresolvable reference as [`LookupError::NotFound`], and everything else as
/// [`LookupError::Transport`].
#[async_trait]
pub trait ChangeLookup: Send + Sync {
    /// Paths of every file changed by one commit.
    async fn commit_files(
        &self,
        repo: &RepositoryRef,
        commit: &CommitRef,
    ) -> Result<Vec<String>, LookupError>;

    /// Paths of every file changed by a pull request.
    async fn pull_request_files(
        &self,
        repo: &RepositoryRef,
        number: PullRequestNumber,
    ) -> Result<Vec<String>, LookupError>;
}

#[async_trait]
impl<T: ChangeLookup + ?Sized> ChangeLookup for Arc<T> {
    async fn commit_files(
        &self,
        repo: &RepositoryRef,
        commit: &CommitRef,
    ) -> Result<Vec<String>, LookupError> {
        (**self).commit_files(repo, commit).await
    }

    async fn pull_request_files(
        &self,
        repo: &RepositoryRef,
        number: PullRequestNumber,
    ) -> Result<Vec<String>, LookupError> {
        (**self).pull_request_files(repo, number).await
    }
}
