//! Commit comment events.
//!
//! The payload names only the commit, so the changed files have to be fetched
//! from the provider. Bot comments are suppressed before that lookup.

use tracing::debug;

use crate::disambiguation::single_package_for_paths;
use crate::payloads::CommitCommentEvent;
use crate::{ChangeLookup, CommitRef, LookupError, PackageRegistry, SuppressionRule, Target};

/// Resolves `commit_comment` events.
#[derive(Clone, Copy)]
pub struct CommitCommentResolver<'a> {
    registry: &'a PackageRegistry,
    suppression: &'a SuppressionRule,
    lookup: &'a dyn ChangeLookup,
}

impl<'a> CommitCommentResolver<'a> {
    /// Creates a resolver.
    pub fn new(
        registry: &'a PackageRegistry,
        suppression: &'a SuppressionRule,
        lookup: &'a dyn ChangeLookup,
    ) -> Self {
        Self {
            registry,
            suppression,
            lookup,
        }
    }

    /// Classifies a commit comment event.
    ///
    /// # Errors
    ///
    /// Propagates the commit lookup failure unchanged. A missing commit is
    /// [`LookupError::NotFound`]; deciding what that means is up to the caller.
    pub async fn resolve(&self, event: &CommitCommentEvent) -> Result<Target, LookupError> {
        let author = &event.comment.user;
        if self.suppression.suppresses(author.id) {
            debug!(author = %author.login, author_id = %author.id, "Suppressed bot commit comment");
            return Ok(Target::Suppressed);
        }

        let repo = event.repository.to_ref();
        let commit = CommitRef::new(event.comment.commit_id.as_str()).ok_or_else(|| {
            LookupError::NotFound {
                message: format!("commit comment on {repo} has no commit id"),
            }
        })?;

        let paths = self.lookup.commit_files(&repo, &commit).await?;
        debug!(repo = %repo, commit = %commit, files = paths.len(), "Fetched commit files");
        Ok(single_package_for_paths(self.registry, &paths))
    }
}

impl std::fmt::Debug for CommitCommentResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitCommentResolver")
            .field("registry", &self.registry)
            .field("suppression", &self.suppression)
            .finish_non_exhaustive()
    }
}
