//! Mapping from routing targets to notification URLs.

use std::collections::HashMap;

use routing::{PackageId, Target};

/// Notification endpoints keyed by routing target.
///
/// URLs usually embed credentials (Discord webhook tokens, for example), so
/// `Debug` only reports which endpoints are configured.
#[derive(Clone, Default)]
pub struct EndpointMap {
    monorepo: Option<String>,
    packages: HashMap<PackageId, String>,
}

impl EndpointMap {
    /// Creates a map with only the catch-all monorepo endpoint.
    pub fn new(monorepo: Option<String>) -> Self {
        Self {
            monorepo,
            packages: HashMap::new(),
        }
    }

    /// Adds (or replaces) the endpoint for one package.
    pub fn with_package(mut self, id: PackageId, url: impl Into<String>) -> Self {
        self.packages.insert(id, url.into());
        self
    }

    /// The catch-all endpoint.
    pub fn monorepo(&self) -> Option<&str> {
        self.monorepo.as_deref()
    }

    /// The endpoint configured for `id` itself, without fallback.
    pub fn package(&self, id: &PackageId) -> Option<&str> {
        self.packages.get(id).map(String::as_str)
    }

    /// Packages that have a dedicated endpoint.
    pub fn configured_packages(&self) -> impl Iterator<Item = &PackageId> + '_ {
        self.packages.keys()
    }

    /// Resolves where an event with `target` should be delivered.
    ///
    /// A package without its own endpoint falls back to the monorepo endpoint.
    /// `Suppressed` never resolves. `None` otherwise means no monorepo
    /// endpoint is configured.
    pub fn endpoint_for(&self, target: &Target) -> Option<&str> {
        match target {
            Target::Package(id) => self.package(id).or_else(|| self.monorepo()),
            Target::Monorepo => self.monorepo(),
            Target::Suppressed => None,
        }
    }
}

impl std::fmt::Debug for EndpointMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut packages: Vec<&str> = self.packages.keys().map(PackageId::as_str).collect();
        packages.sort_unstable();
        f.debug_struct("EndpointMap")
            .field("monorepo", &self.monorepo.is_some())
            .field("packages", &packages)
            .finish()
    }
}
