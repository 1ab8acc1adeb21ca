//! Command-line arguments and their mapping onto a [`MigrationPolicy`].
//!
//! Every value can come from a flag, an `I2R_*` environment variable, or
//! the configuration document. Flags and environment variables win over
//! the document.

use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Args, Parser};
use i2r_core::config::{DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, PROD3_BASE_URL};
use i2r_core::{ApiKey, ConfigError, ConfigFile, KindSelection, MigrationPolicy, NamingPolicy};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Moves inline platform entities to git and republishes the file store.
///
/// Select what to migrate with the kind flags (or `--all`). Entity moves
/// run first, then the file store is mirrored and pushed, then service
/// manifests and overrides are repointed at the pushed files.
#[derive(Debug, Parser)]
#[command(name = "inline-to-remote", version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration document.
    #[arg(short, long, env = "I2R_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Platform account identifier.
    #[arg(long, env = "I2R_ACCOUNT")]
    pub account: Option<String>,

    /// Platform API key.
    #[arg(long, env = "I2R_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Git connector used for every move.
    #[arg(long, env = "I2R_GIT_CONNECTOR_REF")]
    pub git_connector_ref: Option<String>,

    /// Repository the moved entities are committed to.
    #[arg(long, env = "I2R_GIT_REPO_NAME")]
    pub git_repo_name: Option<String>,

    /// Branch the moved entities are committed to.
    #[arg(long, env = "I2R_GIT_BRANCH")]
    pub git_branch: Option<String>,

    /// Projects to migrate, by name or identifier (comma separated).
    #[arg(long, env = "I2R_TARGET_PROJECTS", value_delimiter = ',')]
    pub target_projects: Vec<String>,

    /// Projects to skip, by name or identifier (comma separated).
    ///
    /// Ignored when `--target-projects` is also set.
    #[arg(long, env = "I2R_EXCLUDE_PROJECTS", value_delimiter = ',')]
    pub exclude_projects: Vec<String>,

    /// What to migrate.
    #[command(flatten)]
    pub kinds: KindFlags,

    /// Rewrite service manifests even if they already point at git.
    #[arg(long)]
    pub update_service: bool,

    /// Encode `/` as `%2F` in default-layout paths.
    #[arg(long)]
    pub url_encode_string: bool,

    /// Use the `account/<org>/<project>/<kind>/` layout.
    #[arg(long)]
    pub alt_path: bool,

    /// Put every entity file directly under this directory.
    #[arg(long, env = "I2R_CUSTOM_REMOTE_PATH")]
    pub custom_remote_path: Option<String>,

    /// Use the `.harness/orgs/...` git-experience layout.
    #[arg(long)]
    pub gitx: bool,

    /// Target the prod3 cluster.
    #[arg(long)]
    pub prod3: bool,

    /// Platform base URL (overrides `--prod3`).
    #[arg(long, env = "I2R_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "I2R_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

/// Entity kind and phase selection.
#[derive(Debug, Clone, Copy, Default, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct KindFlags {
    /// Everything below.
    #[arg(long)]
    pub all: bool,
    /// Move pipelines.
    #[arg(long)]
    pub pipelines: bool,
    /// Move input sets of remote pipelines.
    #[arg(long)]
    pub inputsets: bool,
    /// Move templates.
    #[arg(long)]
    pub templates: bool,
    /// Move services.
    #[arg(long)]
    pub services: bool,
    /// Move environments.
    #[arg(long)]
    pub environments: bool,
    /// Move infrastructure definitions of remote environments.
    #[arg(long)]
    pub infra_defs: bool,
    /// Move overrides (v2).
    #[arg(long)]
    pub overrides_v2: bool,
    /// Mirror the file store into git.
    #[arg(long)]
    pub filestore: bool,
    /// Repoint service manifests at the mirrored file store.
    #[arg(long)]
    pub service_manifests: bool,
    /// Repoint service overrides (v1 and v2) at the mirrored file store.
    #[arg(long)]
    pub overrides: bool,
}

impl KindFlags {
    /// Returns the selection these flags describe.
    #[must_use]
    pub const fn selection(self) -> KindSelection {
        if self.all {
            return KindSelection::all();
        }
        KindSelection {
            pipelines: self.pipelines,
            input_sets: self.inputsets,
            templates: self.templates,
            services: self.services,
            environments: self.environments,
            infrastructure: self.infra_defs,
            overrides_v2: self.overrides_v2,
            filestore: self.filestore,
            service_manifests: self.service_manifests,
            service_overrides: self.overrides,
        }
    }
}

// =============================================================================
// POLICY RESOLUTION
// =============================================================================

impl Cli {
    /// Loads the configuration document, if any, and resolves the policy.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be read or parsed, or if the resulting
    /// policy does not validate.
    pub fn policy(&self) -> Result<MigrationPolicy, ConfigError> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let policy = self.merge(file);
        policy.validate()?;
        Ok(policy)
    }

    /// Layers flags over `file`. Does not validate.
    #[must_use]
    pub fn merge(&self, file: ConfigFile) -> MigrationPolicy {
        let mut git = file.git_details.unwrap_or_default();
        if let Some(connector_ref) = &self.git_connector_ref {
            git.connector_ref.clone_from(connector_ref);
        }
        if let Some(repo_name) = &self.git_repo_name {
            git.repo_name.clone_from(repo_name);
        }
        if let Some(branch) = &self.git_branch {
            git.branch_name.clone_from(branch);
        }

        let base_url = match (&self.base_url, self.prod3, file.base_url) {
            (Some(url), _, _) => url.clone(),
            (None, true, _) => PROD3_BASE_URL.to_owned(),
            (None, false, Some(url)) => url,
            (None, false, None) => DEFAULT_BASE_URL.to_owned(),
        };
        let timeout = self
            .timeout_secs
            .or(file.http_timeout_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        MigrationPolicy {
            account: self
                .account
                .clone()
                .or(file.account_identifier)
                .unwrap_or_default(),
            api_key: self
                .api_key
                .clone()
                .map(ApiKey::new)
                .or(file.api_key)
                .unwrap_or_default(),
            target_projects: prefer(&self.target_projects, file.target_projects),
            exclude_projects: prefer(&self.exclude_projects, file.exclude_projects),
            kinds: self.kinds.selection(),
            naming: NamingPolicy {
                custom_path: self.custom_remote_path.clone(),
                url_encode: self.url_encode_string,
                alt_layout: self.alt_path,
                git_experience: self.gitx,
            },
            force_update: self.update_service,
            git,
            filestore: file.file_store_config.unwrap_or_default(),
            target_services: file.target_services,
            exclude_services: file.exclude_services,
            base_url,
            http_timeout: Duration::from_secs(timeout),
        }
    }
}

fn prefer(flags: &[String], file: Vec<String>) -> Vec<String> {
    if flags.is_empty() {
        file
    } else {
        flags.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("inline-to-remote").chain(args.iter().copied()))
            .unwrap()
    }

    const DOCUMENT: &str = "
accountIdentifier: acc
apiKey: pat.secret
targetProjects: [P1, P2]
gitDetails:
  branch_name: main
  commit_message: move
  connector_ref: github
  repo_name: config
fileStoreConfig:
  organization: default
  project: P1
  branch: filestore
targetServices:
  - web: P1
baseUrl: https://example.harness.io
httpTimeoutSecs: 15
";

    #[test]
    fn test_flags_without_document() {
        let cli = parse(&[
            "--account",
            "acc",
            "--api-key",
            "k",
            "--git-connector-ref",
            "gh",
            "--pipelines",
            "--inputsets",
            "--target-projects",
            "P1,P2",
        ]);
        let policy = cli.merge(ConfigFile::default());
        assert_eq!(policy.account, "acc");
        assert_eq!(policy.api_key.expose(), "k");
        assert_eq!(policy.git.connector_ref, "gh");
        assert_eq!(policy.git.branch_name, "migration");
        assert_eq!(policy.target_projects, vec!["P1", "P2"]);
        assert!(policy.kinds.pipelines && policy.kinds.input_sets);
        assert!(!policy.kinds.templates);
        assert_eq!(policy.base_url, DEFAULT_BASE_URL);
        assert_eq!(policy.http_timeout, Duration::from_secs(60));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_flags_override_document() {
        let file = ConfigFile::from_yaml_str(DOCUMENT).unwrap();
        let cli = parse(&["--all", "--git-branch", "feature", "--timeout-secs", "5"]);
        let policy = cli.merge(file);

        assert_eq!(policy.account, "acc");
        assert_eq!(policy.git.branch_name, "feature");
        assert_eq!(policy.git.repo_name, "config");
        assert_eq!(policy.target_projects, vec!["P1", "P2"]);
        assert_eq!(policy.filestore.branch, "filestore");
        assert_eq!(policy.target_services.len(), 1);
        assert_eq!(policy.base_url, "https://example.harness.io");
        assert_eq!(policy.http_timeout, Duration::from_secs(5));
        assert_eq!(policy.kinds, KindSelection::all());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_base_url_precedence() {
        let file = ConfigFile::from_yaml_str(DOCUMENT).unwrap();
        assert_eq!(parse(&["--prod3"]).merge(file.clone()).base_url, PROD3_BASE_URL);
        assert_eq!(
            parse(&["--prod3", "--base-url", "http://localhost:8080"])
                .merge(file)
                .base_url,
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_naming_flags() {
        let cli = parse(&["--url-encode-string", "--gitx", "--custom-remote-path", "x/"]);
        let naming = cli.merge(ConfigFile::default()).naming;
        assert!(naming.url_encode && naming.git_experience && !naming.alt_layout);
        assert_eq!(naming.custom_path(), Some("x"));
    }

    #[test]
    fn test_rewrite_without_filestore_is_rejected() {
        let cli = parse(&[
            "--account",
            "acc",
            "--api-key",
            "k",
            "--service-manifests",
        ]);
        assert!(cli.merge(ConfigFile::default()).validate().is_err());
    }

    #[test]
    fn test_nothing_selected_is_rejected() {
        let cli = parse(&["--account", "acc", "--api-key", "k"]);
        assert!(cli.merge(ConfigFile::default()).validate().is_err());
    }

    #[test]
    fn test_policy_loads_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap();
        let policy = parse(&["--config", path, "--pipelines"]).policy().unwrap();
        assert_eq!(policy.git.connector_ref, "github");
        assert_eq!(policy.filestore.organization, "default");
    }

    #[test]
    fn test_missing_document_is_an_error() {
        let err = parse(&["--config", "/nonexistent/i2r.yaml", "--pipelines"])
            .policy()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
