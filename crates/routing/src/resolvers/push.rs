//! Push events: tag pushes follow the release tag convention, branch pushes
//! are attributed by the paths their commits touched.

use crate::disambiguation::single_package_for_paths;
use crate::payloads::PushEvent;
use crate::resolvers::ReleaseResolver;
use crate::{PackageRegistry, Target};

/// Resolves push events from the pushed ref and commit file lists.
#[derive(Debug, Clone, Copy)]
pub struct PushResolver<'a> {
    registry: &'a PackageRegistry,
}

impl<'a> PushResolver<'a> {
    /// Creates a resolver over `registry`.
    pub fn new(registry: &'a PackageRegistry) -> Self {
        Self { registry }
    }

    /// Classifies a push event.
    pub fn resolve(&self, event: &PushEvent) -> Target {
        if let Some(tag) = event.tag_name() {
            return ReleaseResolver::new(self.registry).resolve_tag(tag);
        }
        single_package_for_paths(self.registry, &event.changed_paths())
    }
}
