//! Pull request events and their review variants.
//!
//! Package labels decide first. Only when no label names a package are the
//! pull request's changed files fetched, so most events resolve without I/O.

use tracing::debug;

use crate::disambiguation::{single_package_for_paths, Scan};
use crate::payloads::PullRequestEvent;
use crate::resolvers::issue::scan_labels;
use crate::{ChangeLookup, LookupError, PackageRegistry, Target};

/// Resolves `pull_request*` events from labels, falling back to changed files.
#[derive(Clone, Copy)]
pub struct PullRequestResolver<'a> {
    registry: &'a PackageRegistry,
    lookup: &'a dyn ChangeLookup,
}

impl<'a> PullRequestResolver<'a> {
    /// Creates a resolver over `registry` that fetches files through `lookup`.
    pub fn new(registry: &'a PackageRegistry, lookup: &'a dyn ChangeLookup) -> Self {
        Self { registry, lookup }
    }

    /// Classifies a pull request event.
    ///
    /// # Errors
    ///
    /// Propagates the lookup failure unchanged when the changed files had to
    /// be fetched and could not be.
    pub async fn resolve(&self, event: &PullRequestEvent) -> Result<Target, LookupError> {
        let pull = &event.pull_request;
        match scan_labels(self.registry, &pull.labels) {
            Scan::Single(id) => return Ok(Target::Package(id.clone())),
            Scan::Ambiguous => return Ok(Target::Monorepo),
            Scan::NoMatch => {}
        }

        let repo = event.repository.to_ref();
        debug!(repo = %repo, number = %pull.number, "No package label, fetching changed files");
        let paths = self.lookup.pull_request_files(&repo, pull.number).await?;
        Ok(single_package_for_paths(self.registry, &paths))
    }
}

impl std::fmt::Debug for PullRequestResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullRequestResolver")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
