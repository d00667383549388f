//! The single-package disambiguation rule shared by every resolver.
//!
//! Packages are scanned in registry order. The first match becomes the
//! candidate; a second match short-circuits to [`Target::Monorepo`]. An empty
//! scan is also [`Target::Monorepo`]: "nothing recognisable" and
//! "cross-cutting" route to the same place.

use crate::{PackageId, PackageRegistry, Target};

/// Outcome of a scan, before zero and many matches are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan<'a> {
    /// No package matched.
    NoMatch,
    /// Exactly one package matched.
    Single(&'a PackageId),
    /// Two or more packages matched; scanning stopped at the second.
    Ambiguous,
}

impl Scan<'_> {
    /// Collapses the scan into a routing target.
    pub fn into_target(self) -> Target {
        match self {
            Scan::Single(id) => Target::Package(id.clone()),
            Scan::NoMatch | Scan::Ambiguous => Target::Monorepo,
        }
    }
}

/// Scans `registry` with `matches` and reports how many packages matched.
pub fn scan<'a, F>(registry: &'a PackageRegistry, mut matches: F) -> Scan<'a>
where
    F: FnMut(&PackageId) -> bool,
{
    let mut candidate = None;
    for id in registry.packages() {
        if !matches(id) {
            continue;
        }
        if candidate.is_some() {
            return Scan::Ambiguous;
        }
        candidate = Some(id);
    }
    candidate.map_or(Scan::NoMatch, Scan::Single)
}

/// Applies the disambiguation rule: exactly one match routes to that package,
/// anything else routes to the monorepo.
pub fn single_package<F>(registry: &PackageRegistry, matches: F) -> Target
where
    F: FnMut(&PackageId) -> bool,
{
    scan(registry, matches).into_target()
}

/// Disambiguates a set of file paths by package path prefix.
pub fn single_package_for_paths<S>(registry: &PackageRegistry, paths: &[S]) -> Target
where
    S: AsRef<str>,
{
    single_package(registry, |id| {
        paths
            .iter()
            .any(|path| registry.path_belongs_to(path.as_ref(), id))
    })
}
