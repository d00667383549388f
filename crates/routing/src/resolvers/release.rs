//! Release events: the package is named by the release tag.
//!
//! Package tags follow `<scope>/<package>@<version>` (`@discordjs/rest@2.1.0`).
//! The primary package is released under bare `X.Y.Z` tags.

use tracing::debug;

use crate::payloads::ReleaseEvent;
use crate::{PackageRegistry, Target};

/// Resolves release events (and tag pushes) from the tag name.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseResolver<'a> {
    registry: &'a PackageRegistry,
}

impl<'a> ReleaseResolver<'a> {
    /// Creates a resolver over `registry`.
    pub fn new(registry: &'a PackageRegistry) -> Self {
        Self { registry }
    }

    /// Classifies a release event.
    pub fn resolve(&self, event: &ReleaseEvent) -> Target {
        self.resolve_tag(&event.release.tag_name)
    }

    /// Classifies a bare tag name.
    pub fn resolve_tag(&self, tag: &str) -> Target {
        let target = match package_token(tag) {
            Some(token) => self
                .registry
                .lookup_tag_token(token)
                .map_or(Target::Monorepo, |id| Target::Package(id.clone())),
            None if is_bare_semver(tag) => self
                .registry
                .primary()
                .map_or(Target::Monorepo, |id| Target::Package(id.clone())),
            None => Target::Monorepo,
        };
        debug!(tag, routed_to = %target, "Resolved release tag");
        target
    }
}

/// Extracts the package token: the second `/` segment, up to the first `@`.
fn package_token(tag: &str) -> Option<&str> {
    let segment = tag.split('/').nth(1)?;
    let token = segment.split('@').next().unwrap_or(segment);
    (!token.is_empty()).then_some(token)
}

/// `^\d+\.\d+\.\d+$`
fn is_bare_semver(tag: &str) -> bool {
    let mut parts = 0;
    for part in tag.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        parts += 1;
    }
    parts == 3
}
