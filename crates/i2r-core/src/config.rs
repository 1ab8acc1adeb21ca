//! Configuration and the immutable migration policy.
//!
//! This module provides:
//!
//! - [`ConfigFile`] - The YAML configuration document as written by operators
//! - [`GitPublishDetails`] / [`GitTarget`] - Where moved entities are committed
//! - [`FileStoreConfig`] - Where the file store mirror is published
//! - [`NamingPolicy`] - The naming-convention flags consumed by [`derive_path`](crate::derive_path)
//! - [`KindSelection`] - Which entity kinds and phases a run covers
//! - [`MigrationPolicy`] - Everything above, resolved once at startup
//!
//! The policy is built by the binary from the config file and command-line
//! flags, validated once, and then only ever borrowed.

use std::fmt;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::types::EntityKind;

/// Default platform base URL.
pub const DEFAULT_BASE_URL: &str = "https://app.harness.io";

/// Base URL of the prod3 cluster.
pub const PROD3_BASE_URL: &str = "https://app3.harness.io";

/// Default per-request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default branch moved entities are committed to.
pub const DEFAULT_BRANCH: &str = "migration";

/// Default commit message for moved entities.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Migrating pipelines from inline to remote";

/// A platform API key.
///
/// `Debug` never prints the key.
///
/// # Examples
///
/// ```
/// use i2r_core::ApiKey;
///
/// let key = ApiKey::new("pat.secret");
/// assert_eq!(key.expose(), "pat.secret");
/// assert_eq!(format!("{key:?}"), "ApiKey(****)");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw key.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw key for use in a request header.
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no key was provided.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Git coordinates shared by every move call in a run.
///
/// The per-entity file path is not part of this value; see [`GitTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitPublishDetails {
    /// Branch the platform commits to.
    pub branch_name: String,
    /// Commit message for every move.
    pub commit_message: String,
    /// Git connector reference.
    pub connector_ref: String,
    /// Repository name.
    pub repo_name: String,
}

impl Default for GitPublishDetails {
    fn default() -> Self {
        Self {
            branch_name: DEFAULT_BRANCH.to_owned(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
            connector_ref: String::new(),
            repo_name: String::new(),
        }
    }
}

impl GitPublishDetails {
    /// Pairs these details with one entity's derived file path.
    #[must_use]
    pub fn target(&self, file_path: String) -> GitTarget<'_> {
        GitTarget {
            details: self,
            file_path,
        }
    }
}

/// The git location a single move call writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitTarget<'a> {
    /// Run-wide git coordinates.
    pub details: &'a GitPublishDetails,
    /// Repository-relative path for this entity.
    pub file_path: String,
}

/// Where the file store mirror is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Organization owning the publish connector.
    pub organization: String,
    /// Project owning the publish connector.
    pub project: String,
    /// Branch the mirror is pushed to.
    pub branch: String,
    /// Explicit clone URL; when absent the connector's URL is used.
    pub url: Option<String>,
    /// Connector used to resolve the clone URL and to rewrite manifests.
    ///
    /// Falls back to [`GitPublishDetails::connector_ref`].
    pub connector_ref: Option<String>,
    /// Local working directory for the mirror repository.
    pub staging_dir: Utf8PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            project: String::new(),
            branch: String::new(),
            url: None,
            connector_ref: None,
            staging_dir: Utf8PathBuf::from("./filestore"),
        }
    }
}

impl FileStoreConfig {
    /// Returns the connector reference, falling back to `git`'s.
    #[must_use]
    pub fn connector_ref<'a>(&'a self, git: &'a GitPublishDetails) -> &'a str {
        self.connector_ref
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(&git.connector_ref)
    }

    /// Returns the explicit clone URL, with `.git` appended if missing.
    #[must_use]
    pub fn explicit_url(&self) -> Option<String> {
        let url = self.url.as_deref().filter(|u| !u.trim().is_empty())?;
        if url.ends_with(".git") {
            Some(url.to_owned())
        } else {
            Some(format!("{url}.git"))
        }
    }
}

/// Naming-convention flags consumed by the path deriver.
///
/// Precedence, highest first: custom path, URL encoding, alt layout,
/// git-experience layout, default layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingPolicy {
    /// Directory every entity file is placed directly under.
    pub custom_path: Option<String>,
    /// Replace `/` with `%2F` in the default layout.
    pub url_encode: bool,
    /// Legacy-tool compatible `account/<org>/<project>/<kind>/` layout.
    pub alt_layout: bool,
    /// The platform's `.harness/orgs/...` layout.
    pub git_experience: bool,
}

impl NamingPolicy {
    /// Returns the custom path if set and non-empty, without trailing `/`.
    #[must_use]
    pub fn custom_path(&self) -> Option<&str> {
        self.custom_path
            .as_deref()
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
    }
}

/// Which entity kinds and phases a run covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct KindSelection {
    /// Move pipelines.
    pub pipelines: bool,
    /// Move input sets of remote pipelines.
    pub input_sets: bool,
    /// Move templates.
    pub templates: bool,
    /// Move services.
    pub services: bool,
    /// Move environments.
    pub environments: bool,
    /// Move infrastructure definitions of remote environments.
    pub infrastructure: bool,
    /// Move service overrides (v2).
    pub overrides_v2: bool,
    /// Download and publish the file store.
    pub filestore: bool,
    /// Rewrite service manifests to point at the published file store.
    pub service_manifests: bool,
    /// Rewrite service overrides (v1 and v2) to point at the published file store.
    pub service_overrides: bool,
}

impl KindSelection {
    /// Selects every kind and phase.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            pipelines: true,
            input_sets: true,
            templates: true,
            services: true,
            environments: true,
            infrastructure: true,
            overrides_v2: true,
            filestore: true,
            service_manifests: true,
            service_overrides: true,
        }
    }

    /// Returns `true` if entities of `kind` should be moved.
    #[must_use]
    pub const fn includes(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Pipeline => self.pipelines,
            EntityKind::InputSet => self.input_sets,
            EntityKind::Template => self.templates,
            EntityKind::Service => self.services,
            EntityKind::Environment => self.environments,
            EntityKind::Infrastructure => self.infrastructure,
            EntityKind::OverrideV2 => self.overrides_v2,
        }
    }

    /// Returns the selected move kinds in run order.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        EntityKind::ALL.into_iter().filter(|kind| self.includes(*kind))
    }

    /// Returns `true` if any manifest rewrite phase is selected.
    #[must_use]
    pub const fn rewrites(&self) -> bool {
        self.service_manifests || self.service_overrides
    }

    /// Returns `true` if anything at all is selected.
    ///
    /// Manifest rewriting alone does not count: it depends on the file store
    /// phase.
    #[must_use]
    pub fn any(&self) -> bool {
        self.filestore || self.service_overrides || self.kinds().next().is_some()
    }
}

/// Matches one service in one project.
///
/// Written in the config file as a single-entry map `{serviceId: projectId}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceSelector {
    /// Service identifier.
    pub service: String,
    /// Project identifier.
    pub project: String,
}

impl ServiceSelector {
    /// Creates a selector.
    #[must_use]
    pub fn new(service: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            project: project.into(),
        }
    }

    /// Returns `true` if this selector names `service` in `project`.
    #[inline]
    #[must_use]
    pub fn matches(&self, service: &str, project: &str) -> bool {
        self.service == service && self.project == project
    }
}

fn deserialize_selectors<'de, D>(deserializer: D) -> Result<Vec<ServiceSelector>, D::Error>
where
    D: Deserializer<'de>,
{
    let maps = Option::<Vec<FxHashMap<String, String>>>::deserialize(deserializer)?;
    let mut selectors: Vec<ServiceSelector> = maps
        .unwrap_or_default()
        .into_iter()
        .flat_map(FxHashMap::into_iter)
        .map(|(service, project)| ServiceSelector { service, project })
        .collect();
    // Multi-entry maps have no inherent order.
    selectors.sort_by(|a, b| (&a.project, &a.service).cmp(&(&b.project, &b.service)));
    Ok(selectors)
}

/// The configuration document.
///
/// Every field is optional; anything missing can be supplied by flags.
///
/// # Examples
///
/// ```
/// use i2r_core::ConfigFile;
///
/// let yaml = "
/// accountIdentifier: acc
/// apiKey: pat.key
/// targetProjects: [P1]
/// gitDetails:
///   connector_ref: github
///   repo_name: harness-config
/// ";
/// let config = ConfigFile::from_yaml_str(yaml).unwrap();
/// assert_eq!(config.account_identifier.as_deref(), Some("acc"));
/// assert_eq!(config.git_details.unwrap().branch_name, "migration");
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigFile {
    /// Platform account identifier.
    pub account_identifier: Option<String>,
    /// Platform API key.
    pub api_key: Option<ApiKey>,
    /// Projects to migrate (names or identifiers).
    pub target_projects: Vec<String>,
    /// Projects to skip (names or identifiers).
    pub exclude_projects: Vec<String>,
    /// Git coordinates for moved entities.
    pub git_details: Option<GitPublishDetails>,
    /// File store publish target.
    pub file_store_config: Option<FileStoreConfig>,
    /// Services whose manifests should be rewritten.
    #[serde(deserialize_with = "deserialize_selectors")]
    pub target_services: Vec<ServiceSelector>,
    /// Services whose manifests should be left alone.
    #[serde(deserialize_with = "deserialize_selectors")]
    pub exclude_services: Vec<ServiceSelector>,
    /// Platform base URL override.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub http_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Reads and parses the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid document.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(%path, "loaded configuration file");
        Self::from_yaml_str(&raw)
    }

    /// Parses a document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `raw` is not a valid document.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Everything a run needs to know, resolved once at startup.
#[derive(Debug, Clone)]
pub struct MigrationPolicy {
    /// Platform account identifier.
    pub account: String,
    /// Platform API key.
    pub api_key: ApiKey,
    /// Projects to migrate.
    pub target_projects: Vec<String>,
    /// Projects to skip.
    pub exclude_projects: Vec<String>,
    /// Selected kinds and phases.
    pub kinds: KindSelection,
    /// Path naming convention.
    pub naming: NamingPolicy,
    /// Rewrite manifests even if they already point at git.
    pub force_update: bool,
    /// Git coordinates for moved entities.
    pub git: GitPublishDetails,
    /// File store publish target.
    pub filestore: FileStoreConfig,
    /// Services whose manifests should be rewritten.
    pub target_services: Vec<ServiceSelector>,
    /// Services whose manifests should be left alone.
    pub exclude_services: Vec<ServiceSelector>,
    /// Platform base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub http_timeout: Duration,
}

impl MigrationPolicy {
    /// Checks the policy for inconsistencies the run cannot recover from.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.trim().is_empty() {
            return Err(ConfigError::missing("accountIdentifier"));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::missing("apiKey"));
        }
        if !self.kinds.any() {
            return Err(ConfigError::invalid(
                "kinds",
                "at least one entity type must be selected (or use --all)",
            ));
        }
        if self.kinds.rewrites() && !self.kinds.filestore {
            return Err(ConfigError::invalid(
                "filestore",
                "rewriting service manifests or overrides requires the file store phase",
            ));
        }
        if self.kinds.filestore && self.filestore.branch.trim().is_empty() {
            return Err(ConfigError::missing("fileStoreConfig.branch"));
        }
        if self.kinds.kinds().next().is_some() && self.git.connector_ref.trim().is_empty() {
            return Err(ConfigError::missing("gitDetails.connector_ref"));
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::invalid("httpTimeoutSecs", "must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> MigrationPolicy {
        MigrationPolicy {
            account: "acc".to_owned(),
            api_key: ApiKey::new("key"),
            target_projects: Vec::new(),
            exclude_projects: Vec::new(),
            kinds: KindSelection {
                pipelines: true,
                ..KindSelection::default()
            },
            naming: NamingPolicy::default(),
            force_update: false,
            git: GitPublishDetails {
                connector_ref: "github".to_owned(),
                ..GitPublishDetails::default()
            },
            filestore: FileStoreConfig::default(),
            target_services: Vec::new(),
            exclude_services: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    #[test]
    fn test_git_details_defaults() {
        let details = GitPublishDetails::default();
        assert_eq!(details.branch_name, "migration");
        assert_eq!(details.commit_message, DEFAULT_COMMIT_MESSAGE);
    }

    #[test]
    fn test_git_target_carries_path() {
        let details = GitPublishDetails::default();
        let target = details.target("pipelines/o/p/x.yaml".to_owned());
        assert_eq!(target.file_path, "pipelines/o/p/x.yaml");
        assert_eq!(target.details.branch_name, "migration");
    }

    #[test]
    fn test_config_file_full_document() {
        let yaml = r"
accountIdentifier: acc
apiKey: pat.abc
targetProjects: [P1, Payments]
excludeProjects: []
gitDetails:
  branch_name: main
  commit_message: move
  connector_ref: org.github
  repo_name: config
fileStoreConfig:
  organization: default
  project: platform
  branch: filestore
  url: https://github.com/acme/files
targetServices:
  - svc1: P1
  - svc2: P2
baseUrl: https://example.test
httpTimeoutSecs: 5
";
        let config = ConfigFile::from_yaml_str(yaml).unwrap();
        assert_eq!(config.target_projects, vec!["P1", "Payments"]);
        let git = config.git_details.unwrap();
        assert_eq!(git.branch_name, "main");
        assert_eq!(git.connector_ref, "org.github");
        let fs = config.file_store_config.unwrap();
        assert_eq!(fs.staging_dir, "./filestore");
        assert_eq!(
            fs.explicit_url().as_deref(),
            Some("https://github.com/acme/files.git")
        );
        assert_eq!(
            config.target_services,
            vec![
                ServiceSelector::new("svc1", "P1"),
                ServiceSelector::new("svc2", "P2")
            ]
        );
        assert!(config.exclude_services.is_empty());
        assert_eq!(config.http_timeout_secs, Some(5));
    }

    #[test]
    fn test_config_file_empty_document() {
        let config = ConfigFile::from_yaml_str("").unwrap();
        assert!(config.account_identifier.is_none());
        assert!(config.target_services.is_empty());
    }

    #[test]
    fn test_config_file_load_missing() {
        let err = ConfigFile::load(Utf8Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_config_file_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("config.yaml")).unwrap();
        std::fs::write(&path, "accountIdentifier: acc\n").unwrap();
        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.account_identifier.as_deref(), Some("acc"));
    }

    #[test]
    fn test_filestore_connector_fallback() {
        let git = GitPublishDetails {
            connector_ref: "git-conn".to_owned(),
            ..GitPublishDetails::default()
        };
        let mut fs = FileStoreConfig::default();
        assert_eq!(fs.connector_ref(&git), "git-conn");
        fs.connector_ref = Some("fs-conn".to_owned());
        assert_eq!(fs.connector_ref(&git), "fs-conn");
    }

    #[test]
    fn test_explicit_url_keeps_git_suffix() {
        let fs = FileStoreConfig {
            url: Some("https://x/y.git".to_owned()),
            ..FileStoreConfig::default()
        };
        assert_eq!(fs.explicit_url().as_deref(), Some("https://x/y.git"));
        assert!(FileStoreConfig::default().explicit_url().is_none());
    }

    #[test]
    fn test_naming_custom_path_trimmed() {
        let naming = NamingPolicy {
            custom_path: Some("remote/".to_owned()),
            ..NamingPolicy::default()
        };
        assert_eq!(naming.custom_path(), Some("remote"));
        assert_eq!(NamingPolicy::default().custom_path(), None);
    }

    #[test]
    fn test_kind_selection_order() {
        let kinds = KindSelection {
            overrides_v2: true,
            pipelines: true,
            ..KindSelection::default()
        };
        let selected: Vec<_> = kinds.kinds().collect();
        assert_eq!(selected, vec![EntityKind::Pipeline, EntityKind::OverrideV2]);
        assert_eq!(KindSelection::all().kinds().count(), 7);
    }

    #[test]
    fn test_validate_ok() {
        assert!(policy().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_account_and_key() {
        let mut p = policy();
        p.account = String::new();
        assert!(matches!(p.validate(), Err(ConfigError::MissingOption(o)) if o == "accountIdentifier"));
        let mut p = policy();
        p.api_key = ApiKey::default();
        assert!(matches!(p.validate(), Err(ConfigError::MissingOption(o)) if o == "apiKey"));
    }

    #[test]
    fn test_validate_requires_some_kind() {
        let mut p = policy();
        p.kinds = KindSelection::default();
        assert!(matches!(p.validate(), Err(ConfigError::InvalidOption { .. })));
    }

    #[test]
    fn test_validate_rewrite_needs_filestore() {
        let mut p = policy();
        p.kinds.service_manifests = true;
        assert!(p.validate().is_err());
        p.kinds.filestore = true;
        p.filestore.branch = "files".to_owned();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate_filestore_needs_branch() {
        let mut p = policy();
        p.kinds.filestore = true;
        assert!(matches!(
            p.validate(),
            Err(ConfigError::MissingOption(o)) if o == "fileStoreConfig.branch"
        ));
    }

    #[test]
    fn test_api_key_debug_redacted() {
        let key = ApiKey::new("super-secret");
        assert!(!format!("{key:?}").contains("super-secret"));
    }
}
