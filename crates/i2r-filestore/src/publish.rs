//! Phase 2: turning the staging tree into a pushed branch.

use camino::{Utf8Path, Utf8PathBuf};
use i2r_core::{FileStoreConfig, GitPublishDetails, Scope};
use i2r_platform::PlatformApi;

use crate::error::FileStoreError;
use crate::git::{GIT_STEPS, GitRunner, GitStep, StepOutcome, classify};

/// Commit message of the mirror commit.
pub const PUBLISH_COMMIT_MESSAGE: &str = "Initial Filestore commit";

/// Resolves the clone URL the mirror is pushed to.
///
/// An explicit URL in `config` wins. Otherwise the publish connector is
/// looked up at the file store's org/project scope and its URL is used,
/// with the repository name appended for account-level connectors.
pub async fn resolve_remote_url<P: PlatformApi + ?Sized>(
    platform: &P,
    config: &FileStoreConfig,
    git: &GitPublishDetails,
) -> Result<String, FileStoreError> {
    if let Some(url) = config.explicit_url() {
        return Ok(url);
    }
    let reference = config.connector_ref(git);
    if reference.is_empty() {
        return Err(FileStoreError::Remote(
            "neither a file store URL nor a connector reference is configured".to_owned(),
        ));
    }
    let scope = Scope::from_parts(Some(&config.organization), Some(&config.project));
    let connector = platform
        .get_connector(&scope, reference)
        .await
        .map_err(|source| FileStoreError::Connector {
            reference: reference.to_owned(),
            source,
        })?;
    if connector.spec.url.is_empty() {
        return Err(FileStoreError::Remote(format!(
            "connector '{reference}' has no URL"
        )));
    }
    Ok(connector.repository_url(&git.repo_name))
}

/// What the publish workflow did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Every step that ran, with its outcome.
    pub steps: Vec<(GitStep, StepOutcome)>,
    /// Whether the branch had to be created locally.
    pub created_branch: bool,
}

impl PublishReport {
    /// Returns the steps that ended with a benign outcome.
    pub fn benign(&self) -> impl Iterator<Item = (GitStep, &'static str)> + '_ {
        self.steps.iter().filter_map(|(step, outcome)| match outcome {
            StepOutcome::Benign(pattern) => Some((*step, *pattern)),
            StepOutcome::Done | StepOutcome::Failed => None,
        })
    }
}

/// Drives the git workflow in the staging directory.
#[derive(Debug)]
pub struct GitPublisher<R> {
    runner: R,
    workdir: Utf8PathBuf,
}

impl<R: GitRunner> GitPublisher<R> {
    /// Creates a publisher working in `workdir`.
    pub fn new(runner: R, workdir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }

    /// Returns the working directory.
    #[must_use]
    pub fn workdir(&self) -> &Utf8Path {
        &self.workdir
    }

    /// Commits the staging tree and pushes it to `branch` on `remote_url`.
    ///
    /// Steps run in [`GIT_STEPS`] order. A failing `show-ref` means the
    /// branch does not exist locally and triggers `checkout -b`; otherwise
    /// checkout is skipped. Any failure that is not a benign outcome of its
    /// step stops the workflow.
    pub fn publish(&self, remote_url: &str, branch: &str) -> Result<PublishReport, FileStoreError> {
        std::fs::create_dir_all(&self.workdir)
            .map_err(|source| FileStoreError::io(self.workdir.clone(), source))?;

        let mut report = PublishReport::default();
        let mut branch_exists = true;
        for spec in GIT_STEPS {
            let value = match spec.step {
                GitStep::Commit => PUBLISH_COMMIT_MESSAGE,
                GitStep::RemoteAdd => remote_url,
                GitStep::ShowRef | GitStep::Checkout | GitStep::Pull | GitStep::Push => branch,
                GitStep::Init | GitStep::ConfigPull | GitStep::Add => "",
            };
            match spec.step {
                GitStep::ShowRef => {
                    let output = self.run(spec.step, value)?;
                    branch_exists = output.success;
                    let outcome = if branch_exists {
                        StepOutcome::Done
                    } else {
                        StepOutcome::Failed
                    };
                    report.steps.push((spec.step, outcome));
                }
                GitStep::Checkout if branch_exists => {}
                GitStep::Checkout => {
                    self.step(spec.step, value, &mut report)?;
                    report.created_branch = true;
                }
                step => self.step(step, value, &mut report)?,
            }
        }
        tracing::info!(branch, remote = remote_url, "published file store mirror");
        Ok(report)
    }

    fn run(&self, step: GitStep, value: &str) -> Result<crate::git::GitOutput, FileStoreError> {
        let args = step.args(value);
        tracing::debug!(%step, ?args, "running git");
        self.runner
            .run(&self.workdir, &args)
            .map_err(|source| FileStoreError::Spawn { step, source })
    }

    fn step(
        &self,
        step: GitStep,
        value: &str,
        report: &mut PublishReport,
    ) -> Result<(), FileStoreError> {
        let output = self.run(step, value)?;
        let outcome = classify(step, &output);
        report.steps.push((step, outcome));
        match outcome {
            StepOutcome::Done => Ok(()),
            StepOutcome::Benign(pattern) => {
                tracing::info!(%step, pattern, "git step already satisfied");
                Ok(())
            }
            StepOutcome::Failed => Err(FileStoreError::Git {
                step,
                output: output.output,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::scripted::ScriptedGit;
    use crate::git::{GitOutput, SystemGit};
    use i2r_core::{Connector, ConnectorSpec};
    use i2r_platform::fake::FakePlatform;

    const URL: &str = "https://git.example.com/org/mirror.git";

    fn publisher(git: ScriptedGit) -> (GitPublisher<ScriptedGit>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let workdir = Utf8PathBuf::from_path_buf(dir.path().join("staging")).unwrap();
        (GitPublisher::new(git, workdir), dir)
    }

    #[test]
    fn test_first_publish_creates_branch() {
        let git = ScriptedGit::default().reply("show-ref", GitOutput::failed(""));
        let (publisher, _dir) = publisher(git);
        let report = publisher.publish(URL, "filestore").unwrap();

        assert!(report.created_branch);
        assert!(publisher.workdir().exists());
        assert_eq!(
            publisher.runner.verbs(),
            vec![
                "init", "config", "add", "commit", "remote", "show-ref", "checkout", "pull",
                "push"
            ]
        );
        let calls = publisher.runner.calls.lock();
        assert_eq!(calls[4], vec!["remote", "add", "origin", URL]);
        assert_eq!(calls[8], vec!["push", "origin", "filestore"]);
    }

    #[test]
    fn test_second_publish_is_idempotent() {
        let git = ScriptedGit::default()
            .reply("init", GitOutput::ok("Reinitialized existing Git repository"))
            .reply("commit", GitOutput::failed("nothing to commit, working tree clean"))
            .reply(
                "remote",
                GitOutput::failed("error: remote origin already exists."),
            )
            .reply(
                "pull",
                GitOutput::failed("fatal: couldn't find remote ref filestore"),
            );
        let (publisher, _dir) = publisher(git);
        let report = publisher.publish(URL, "filestore").unwrap();

        assert!(!report.created_branch);
        let benign: Vec<_> = report.benign().map(|(step, _)| step).collect();
        assert_eq!(
            benign,
            vec![
                GitStep::Init,
                GitStep::Commit,
                GitStep::RemoteAdd,
                GitStep::Pull
            ]
        );
        assert!(!publisher.runner.verbs().contains(&"checkout".to_owned()));
        assert_eq!(publisher.runner.verbs().last().map(String::as_str), Some("push"));
    }

    #[test]
    fn test_unexpected_failure_stops_publish() {
        let git = ScriptedGit::default().reply(
            "push",
            GitOutput::failed("! [rejected] filestore -> filestore (non-fast-forward)"),
        );
        let (publisher, _dir) = publisher(git);
        let err = publisher.publish(URL, "filestore").unwrap_err();
        assert!(matches!(err, FileStoreError::Git { step: GitStep::Push, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_add_failure_stops_before_commit() {
        let git = ScriptedGit::default().reply("add", GitOutput::failed("fatal: bad path"));
        let (publisher, _dir) = publisher(git);
        assert!(publisher.publish(URL, "b").is_err());
        assert_eq!(publisher.runner.verbs(), vec!["init", "config", "add"]);
    }

    /// The system git, with a repository-local identity set before the
    /// first commit so the run does not depend on the user's git config.
    struct LocalIdentityGit;

    impl GitRunner for LocalIdentityGit {
        fn run(&self, cwd: &Utf8Path, args: &[String]) -> std::io::Result<GitOutput> {
            if args.first().map(String::as_str) == Some("commit") {
                for (key, value) in [("user.name", "i2r"), ("user.email", "i2r@example.com")] {
                    SystemGit.run(cwd, &["config".to_owned(), key.to_owned(), value.to_owned()])?;
                }
            }
            SystemGit.run(cwd, args)
        }
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn outcome(report: &PublishReport, step: GitStep) -> Option<StepOutcome> {
        report
            .steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| *outcome)
    }

    #[test]
    fn test_publish_to_bare_remote_twice() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let remote = root.join("remote.git");
        let init = SystemGit
            .run(&root, &["init".to_owned(), "--bare".to_owned(), remote.to_string()])
            .unwrap();
        assert!(init.success, "{}", init.output);

        let staging = root.join("staging");
        std::fs::create_dir_all(staging.join("filestore/account")).unwrap();
        std::fs::write(staging.join("filestore/account/values.yaml"), "replicas: 2\n").unwrap();
        let publisher = GitPublisher::new(LocalIdentityGit, staging);

        let first = publisher.publish(remote.as_str(), "filestore").unwrap();
        assert!(first.created_branch);
        assert_eq!(outcome(&first, GitStep::ShowRef), Some(StepOutcome::Failed));
        assert_eq!(outcome(&first, GitStep::Checkout), Some(StepOutcome::Done));
        assert_eq!(
            outcome(&first, GitStep::Pull),
            Some(StepOutcome::Benign("couldn't find remote ref"))
        );

        let second = publisher.publish(remote.as_str(), "filestore").unwrap();
        assert!(!second.created_branch);
        assert_eq!(
            outcome(&second, GitStep::Init),
            Some(StepOutcome::Benign("Reinitialized existing"))
        );
        assert_eq!(
            outcome(&second, GitStep::Commit),
            Some(StepOutcome::Benign("nothing to commit"))
        );
        assert_eq!(
            outcome(&second, GitStep::RemoteAdd),
            Some(StepOutcome::Benign("remote origin already exists"))
        );
        assert_eq!(outcome(&second, GitStep::Checkout), None);

        let tree = SystemGit
            .run(
                &remote,
                &[
                    "ls-tree".to_owned(),
                    "-r".to_owned(),
                    "--name-only".to_owned(),
                    "filestore".to_owned(),
                ],
            )
            .unwrap();
        assert!(tree.success, "{}", tree.output);
        assert_eq!(tree.output, "filestore/account/values.yaml");
    }

    fn connector(connection_type: &str) -> Connector {
        Connector {
            identifier: "gl".to_owned(),
            connector_type: "Gitlab".to_owned(),
            spec: ConnectorSpec {
                url: "https://gitlab.example.com/team".to_owned(),
                connection_type: Some(connection_type.to_owned()),
            },
        }
    }

    fn details() -> GitPublishDetails {
        GitPublishDetails {
            connector_ref: "org.gl".to_owned(),
            repo_name: "mirror".to_owned(),
            ..GitPublishDetails::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_explicit_url_wins() {
        let fake = FakePlatform::new();
        let config = FileStoreConfig {
            url: Some("https://git.example.com/x".to_owned()),
            ..FileStoreConfig::default()
        };
        let url = resolve_remote_url(&fake, &config, &details()).await.unwrap();
        assert_eq!(url, "https://git.example.com/x.git");
        assert_eq!(fake.inspect(|s| s.connector_lookups), 0);
    }

    #[tokio::test]
    async fn test_resolve_account_connector_appends_repo() {
        let fake = FakePlatform::new();
        fake.edit(|s| {
            s.connectors.insert("gl".to_owned(), connector("Account"));
        });
        let url = resolve_remote_url(&fake, &FileStoreConfig::default(), &details())
            .await
            .unwrap();
        assert_eq!(url, "https://gitlab.example.com/team/mirror.git");
    }

    #[tokio::test]
    async fn test_resolve_unknown_connector_is_fatal() {
        let fake = FakePlatform::new();
        let err = resolve_remote_url(&fake, &FileStoreConfig::default(), &details())
            .await
            .unwrap_err();
        assert!(matches!(err, FileStoreError::Connector { .. }));
        assert!(err.is_fatal());
    }
}
