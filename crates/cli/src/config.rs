//! TOML configuration and its validation into runtime settings.
//!
//! Every section is optional. An absent file behaves like an empty one: the
//! built-in discord.js registry, both bot suppressions enabled, the public
//! GitHub API, and no endpoints.
//!
//! ```toml
//! [github]
//! api_url = "https://api.github.com"
//! timeout_secs = 10
//!
//! [suppression]
//! discard_codecov_comments = true
//! discard_vercel_comments = true
//! extra_bot_ids = [41898282]
//!
//! [endpoints]
//! monorepo = "https://discord.com/api/webhooks/1/aaa/github"
//!
//! [endpoints.packages]
//! rest = "https://discord.com/api/webhooks/2/bbb/github"
//!
//! [registry]
//! primary = "core"
//! label_prefix = "packages:"
//!
//! [[registry.packages]]
//! id = "core"
//!
//! [[registry.packages]]
//! id = "rest"
//! path_prefix = "libs/rest/"
//! tag_token = "rest-client"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gateway::EndpointMap;
use github::{GitHubClientConfig, DEFAULT_API_URL};
use routing::{
    PackageEntry, PackageId, PackageRegistry, RegistryError, SuppressionRule, UserId,
    DEFAULT_LABEL_PREFIX,
};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The `[registry]` table is invalid.
    #[error("invalid package registry: {0}")]
    Registry(#[from] RegistryError),

    /// `[endpoints.packages]` names a package the registry does not know.
    #[error("endpoint configured for unregistered package '{0}'")]
    UnknownPackage(String),

    /// An endpoint is not an http(s) URL.
    #[error("endpoint for {target} is not an http(s) URL")]
    InvalidEndpoint { target: String },

    /// A timeout of zero would fail every request.
    #[error("[{section}] timeout_secs must be greater than zero")]
    ZeroTimeout { section: &'static str },
}

/// Values that come from flags or the environment rather than the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Token for the GitHub API.
    pub github_token: Option<String>,
    /// Replaces `[endpoints] monorepo`.
    pub monorepo_endpoint: Option<String>,
}

/// Validated settings the binary wires together.
#[derive(Debug)]
pub struct Settings {
    pub registry: PackageRegistry,
    pub suppression: SuppressionRule,
    pub endpoints: EndpointMap,
    pub github: GitHubClientConfig,
    pub forward_timeout: Duration,
}

/// The configuration file as written.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub github: GitHubSection,
    pub suppression: SuppressionSection,
    pub endpoints: EndpointsSection,
    pub forwarding: ForwardingSection,
    pub registry: Option<RegistrySection>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubSection {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuppressionSection {
    pub discard_codecov_comments: bool,
    pub discard_vercel_comments: bool,
    pub extra_bot_ids: Vec<u64>,
}

impl Default for SuppressionSection {
    fn default() -> Self {
        Self {
            discard_codecov_comments: true,
            discard_vercel_comments: true,
            extra_bot_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointsSection {
    pub monorepo: Option<String>,
    pub packages: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForwardingSection {
    pub timeout_secs: u64,
}

impl Default for ForwardingSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Replaces the built-in discord.js package table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    pub primary: Option<String>,
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
    pub packages: Vec<RegistryPackage>,
}

/// One `[[registry.packages]]` entry. Omitted fields take the conventional
/// `packages/<id>/` prefix and the id as tag token.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryPackage {
    pub id: String,
    pub path_prefix: Option<String>,
    pub tag_token: Option<String>,
}

fn default_label_prefix() -> String {
    DEFAULT_LABEL_PREFIX.to_owned()
}

impl FileConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parses configuration text; `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`].
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_owned(),
            source,
        })
    }

    /// Validates the file and applies `overrides`.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] describing the first problem found.
    pub fn into_settings(self, overrides: Overrides) -> Result<Settings, ConfigError> {
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout { section: "github" });
        }
        if self.forwarding.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout {
                section: "forwarding",
            });
        }

        let registry = match self.registry {
            Some(section) => section.into_registry()?,
            None => PackageRegistry::discord_js(),
        };

        let suppression = SuppressionRule::new(
            self.suppression.discard_codecov_comments,
            self.suppression.discard_vercel_comments,
            self.suppression.extra_bot_ids.into_iter().map(UserId::new),
        );

        let monorepo = overrides
            .monorepo_endpoint
            .filter(|url| !url.is_empty())
            .or(self.endpoints.monorepo);
        if let Some(url) = &monorepo {
            check_endpoint("monorepo", url)?;
        }
        let mut endpoints = EndpointMap::new(monorepo);
        for (name, url) in self.endpoints.packages {
            let id = PackageId::new(name.as_str())
                .filter(|id| registry.contains(id))
                .ok_or_else(|| ConfigError::UnknownPackage(name.clone()))?;
            check_endpoint(&name, &url)?;
            endpoints = endpoints.with_package(id, url);
        }

        let github = GitHubClientConfig {
            api_url: self.github.api_url,
            token: overrides.github_token.filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(self.github.timeout_secs),
            ..GitHubClientConfig::default()
        };

        Ok(Settings {
            registry,
            suppression,
            endpoints,
            github,
            forward_timeout: Duration::from_secs(self.forwarding.timeout_secs),
        })
    }
}

impl RegistrySection {
    fn into_registry(self) -> Result<PackageRegistry, RegistryError> {
        let mut entries = Vec::with_capacity(self.packages.len());
        for (index, package) in self.packages.into_iter().enumerate() {
            let id = PackageId::new(package.id).ok_or(RegistryError::EmptyField { index, field: "id" })?;
            let mut entry = PackageEntry::conventional(id);
            if let Some(prefix) = package.path_prefix {
                entry.path_prefix = prefix;
            }
            if let Some(token) = package.tag_token {
                entry.tag_token = token;
            }
            entries.push(entry);
        }

        let primary = match self.primary {
            Some(name) => {
                Some(PackageId::new(name.as_str()).ok_or(RegistryError::UnknownPrimary(name))?)
            }
            None => None,
        };

        PackageRegistry::new(entries, primary, self.label_prefix)
    }
}

fn check_endpoint(target: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEndpoint {
            target: target.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use routing::{Target, CODECOV_BOT_ID, VERCEL_BOT_ID};

    fn parse(text: &str) -> FileConfig {
        FileConfig::parse(text, Path::new("test.toml")).unwrap()
    }

    fn settings(text: &str) -> Result<Settings, ConfigError> {
        parse(text).into_settings(Overrides::default())
    }

    fn pkg(name: &str) -> PackageId {
        PackageId::new(name).unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = settings("").unwrap();

        assert_eq!(settings.registry, PackageRegistry::discord_js());
        assert!(settings.suppression.suppresses(CODECOV_BOT_ID));
        assert!(settings.suppression.suppresses(VERCEL_BOT_ID));
        assert_eq!(settings.github.api_url, DEFAULT_API_URL);
        assert_eq!(settings.github.timeout, Duration::from_secs(10));
        assert_eq!(settings.endpoints.monorepo(), None);
        assert_eq!(settings.forward_timeout, Duration::from_secs(10));
    }

    #[test]
    fn full_file_is_applied() {
        let settings = settings(
            r#"
            [github]
            api_url = "https://ghe.example.com/api/v3"
            timeout_secs = 3

            [suppression]
            discard_codecov_comments = false
            extra_bot_ids = [41898282]

            [endpoints]
            monorepo = "https://hooks.example.com/mono"

            [endpoints.packages]
            rest = "https://hooks.example.com/rest"

            [registry]
            primary = "core"

            [[registry.packages]]
            id = "core"

            [[registry.packages]]
            id = "rest"
            path_prefix = "libs/rest/"
            tag_token = "rest-client"
            "#,
        )
        .unwrap();

        assert_eq!(settings.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(settings.github.timeout, Duration::from_secs(3));

        assert!(!settings.suppression.suppresses(CODECOV_BOT_ID));
        assert!(settings.suppression.suppresses(VERCEL_BOT_ID));
        assert!(settings.suppression.suppresses(UserId::new(41898282)));

        assert_eq!(settings.registry.len(), 2);
        assert_eq!(settings.registry.primary(), Some(&pkg("core")));
        assert_eq!(settings.registry.path_prefix_for(&pkg("rest")), Some("libs/rest/"));
        assert_eq!(
            settings.registry.lookup_tag_token("rest-client"),
            Some(&pkg("rest"))
        );
        assert_eq!(
            settings.registry.path_prefix_for(&pkg("core")),
            Some("packages/core/")
        );

        assert_eq!(
            settings.endpoints.endpoint_for(&Target::Package(pkg("rest"))),
            Some("https://hooks.example.com/rest")
        );
        assert_eq!(
            settings.endpoints.endpoint_for(&Target::Package(pkg("core"))),
            Some("https://hooks.example.com/mono")
        );
    }

    #[test]
    fn overrides_take_precedence() {
        let settings = parse(
            r#"
            [endpoints]
            monorepo = "https://hooks.example.com/from-file"
            "#,
        )
        .into_settings(Overrides {
            github_token: Some("ghp_token".into()),
            monorepo_endpoint: Some("https://hooks.example.com/from-env".into()),
        })
        .unwrap();

        assert_eq!(
            settings.endpoints.monorepo(),
            Some("https://hooks.example.com/from-env")
        );
        assert_eq!(settings.github.token.as_deref(), Some("ghp_token"));
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let settings = parse(
            r#"
            [endpoints]
            monorepo = "https://hooks.example.com/from-file"
            "#,
        )
        .into_settings(Overrides {
            github_token: Some(String::new()),
            monorepo_endpoint: Some(String::new()),
        })
        .unwrap();

        assert_eq!(
            settings.endpoints.monorepo(),
            Some("https://hooks.example.com/from-file")
        );
        assert_eq!(settings.github.token, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FileConfig::parse("[github]\napi_ulr = \"x\"\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn endpoint_for_unregistered_package_is_rejected() {
        let err = settings(
            r#"
            [endpoints.packages]
            left-pad = "https://hooks.example.com/left-pad"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::UnknownPackage(name) if name == "left-pad"));
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let err = settings(
            r#"
            [endpoints]
            monorepo = "discord.com/api/webhooks/1"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidEndpoint { target } if target == "monorepo"));
    }

    #[test]
    fn invalid_registry_is_rejected() {
        let err = settings(
            r#"
            [registry]
            primary = "ghost"

            [[registry.packages]]
            id = "core"
            "#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Registry(RegistryError::UnknownPrimary(name)) if name == "ghost"
        ));
    }

    #[test]
    fn duplicate_tag_tokens_are_rejected() {
        let err = settings(
            r#"
            [[registry.packages]]
            id = "a"
            tag_token = "shared"

            [[registry.packages]]
            id = "b"
            tag_token = "shared"
            "#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Registry(RegistryError::DuplicateTagToken(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = settings("[forwarding]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout { section: "forwarding" }));
    }
}
