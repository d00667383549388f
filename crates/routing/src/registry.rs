//! The package registry: the closed, ordered set of packages an event can be
//! routed to.
//!
//! Registry order is the scan order of the disambiguation rule, so it must be
//! stable. The table is validated once at construction; every query afterwards
//! is infallible.

use serde::{Deserialize, Serialize};

use crate::{PackageId, RegistryError};

/// Label prefix used when none is configured (`packages:builders`).
pub const DEFAULT_LABEL_PREFIX: &str = "packages:";

/// Directory holding the packages in the repository tree.
const PACKAGES_DIR: &str = "packages";

/// Packages of the discord.js monorepo, in scan order.
const DISCORD_JS_PACKAGES: &[&str] = &[
    "brokers",
    "builders",
    "collection",
    "core",
    "create-discord-bot",
    "discord.js",
    "formatters",
    "next",
    "proxy",
    "rest",
    "structures",
    "util",
    "voice",
    "ws",
];

/// Package released under bare `X.Y.Z` tags in the discord.js monorepo.
const DISCORD_JS_PRIMARY: &str = "discord.js";

/// How one package is recognised in paths, tags, and labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// The package identifier.
    pub id: PackageId,
    /// Path prefix of files belonging to the package (e.g. `packages/rest/`).
    pub path_prefix: String,
    /// Token naming the package in release tags (`@discordjs/rest@2.0.0`).
    pub tag_token: String,
}

impl PackageEntry {
    /// Builds an entry with the conventional `packages/<id>/` prefix and the id
    /// as tag token.
    pub fn conventional(id: PackageId) -> Self {
        Self {
            path_prefix: format!("{PACKAGES_DIR}/{id}/"),
            tag_token: id.as_str().to_owned(),
            id,
        }
    }
}

/// Ordered, immutable table of known packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRegistry {
    entries: Vec<PackageEntry>,
    primary: Option<PackageId>,
    label_prefix: String,
}

impl PackageRegistry {
    /// Builds a registry from an ordered table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if any field is empty, an id or tag token is
    /// repeated, or `primary` names an unregistered package.
    pub fn new(
        entries: Vec<PackageEntry>,
        primary: Option<PackageId>,
        label_prefix: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        for (index, entry) in entries.iter().enumerate() {
            if entry.path_prefix.is_empty() {
                return Err(RegistryError::EmptyField {
                    index,
                    field: "path_prefix",
                });
            }
            if entry.tag_token.is_empty() {
                return Err(RegistryError::EmptyField {
                    index,
                    field: "tag_token",
                });
            }
            let earlier = &entries[..index];
            if earlier.iter().any(|e| e.id == entry.id) {
                return Err(RegistryError::DuplicatePackage(entry.id.to_string()));
            }
            if earlier.iter().any(|e| e.tag_token == entry.tag_token) {
                return Err(RegistryError::DuplicateTagToken(entry.tag_token.clone()));
            }
        }

        if let Some(primary) = &primary {
            if !entries.iter().any(|e| &e.id == primary) {
                return Err(RegistryError::UnknownPrimary(primary.to_string()));
            }
        }

        Ok(Self {
            entries,
            primary,
            label_prefix: label_prefix.into(),
        })
    }

    /// Builds a registry of conventional entries from bare package names.
    ///
    /// # Errors
    ///
    /// See [`PackageRegistry::new`]; an empty name yields
    /// [`RegistryError::EmptyField`].
    pub fn from_names<'a>(
        names: impl IntoIterator<Item = &'a str>,
        primary: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        for (index, name) in names.into_iter().enumerate() {
            let id = PackageId::new(name).ok_or(RegistryError::EmptyField { index, field: "id" })?;
            entries.push(PackageEntry::conventional(id));
        }
        let primary = match primary {
            Some(name) => Some(
                PackageId::new(name)
                    .ok_or_else(|| RegistryError::UnknownPrimary(String::new()))?,
            ),
            None => None,
        };
        Self::new(entries, primary, DEFAULT_LABEL_PREFIX)
    }

    /// The built-in table describing the discord.js monorepo.
    pub fn discord_js() -> Self {
        let entries = DISCORD_JS_PACKAGES
            .iter()
            .filter_map(|name| PackageId::new(*name))
            .map(PackageEntry::conventional)
            .collect();
        Self {
            entries,
            primary: PackageId::new(DISCORD_JS_PRIMARY),
            label_prefix: DEFAULT_LABEL_PREFIX.to_owned(),
        }
    }

    /// Registered packages in scan order.
    pub fn packages(&self) -> impl Iterator<Item = &PackageId> + '_ {
        self.entries.iter().map(|e| &e.id)
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no package is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: &PackageId) -> bool {
        self.entry(id).is_some()
    }

    /// Path prefix for a registered package.
    pub fn path_prefix_for(&self, id: &PackageId) -> Option<&str> {
        self.entry(id).map(|e| e.path_prefix.as_str())
    }

    /// Tag token for a registered package.
    pub fn tag_token_for(&self, id: &PackageId) -> Option<&str> {
        self.entry(id).map(|e| e.tag_token.as_str())
    }

    /// Resolves a release-tag token to its package. Matching is exact.
    pub fn lookup_tag_token(&self, token: &str) -> Option<&PackageId> {
        self.entries
            .iter()
            .find(|e| e.tag_token == token)
            .map(|e| &e.id)
    }

    /// Package released under bare semantic-version tags, if any.
    pub fn primary(&self) -> Option<&PackageId> {
        self.primary.as_ref()
    }

    /// The label naming `id`, e.g. `packages:rest`.
    pub fn label_for(&self, id: &PackageId) -> String {
        format!("{}{}", self.label_prefix, id.as_str())
    }

    /// Returns `true` if `path` lies inside the package `id`.
    pub fn path_belongs_to(&self, path: &str, id: &PackageId) -> bool {
        self.path_prefix_for(id)
            .is_some_and(|prefix| path.starts_with(prefix))
    }

    fn entry(&self, id: &PackageId) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }
}

impl Default for PackageRegistry {
    fn default() -> Self {
        Self::discord_js()
    }
}
