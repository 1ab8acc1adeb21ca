//! The git step vocabulary and a runner abstraction over the `git` binary.
//!
//! Each publish step has a fixed argument shape and a list of output
//! patterns that mean "this already happened" rather than "this failed".
//! The patterns match git's English messages and may not hold for other
//! git versions or locales.

use std::fmt;
use std::process::Command;

use camino::Utf8Path;

/// One step of the publish workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitStep {
    /// `git init`
    Init,
    /// `git config pull.rebase false`
    ConfigPull,
    /// `git add .`
    Add,
    /// `git commit -m <message>`
    Commit,
    /// `git remote add origin <url>`
    RemoteAdd,
    /// `git show-ref --verify --quiet refs/heads/<branch>`
    ShowRef,
    /// `git checkout -b <branch>`
    Checkout,
    /// `git pull origin <branch> --allow-unrelated-histories --no-ff`
    Pull,
    /// `git push origin <branch>`
    Push,
}

/// A step and the outputs that make its failure harmless.
#[derive(Debug, Clone, Copy)]
pub struct StepSpec {
    /// The step.
    pub step: GitStep,
    /// Substrings of the combined output that mark a benign outcome.
    pub benign: &'static [&'static str],
}

/// The publish workflow, in execution order.
pub const GIT_STEPS: [StepSpec; 9] = [
    StepSpec {
        step: GitStep::Init,
        benign: &["already a git repository", "Reinitialized existing"],
    },
    StepSpec {
        step: GitStep::ConfigPull,
        benign: &[],
    },
    StepSpec {
        step: GitStep::Add,
        benign: &[],
    },
    StepSpec {
        step: GitStep::Commit,
        benign: &["nothing to commit"],
    },
    StepSpec {
        step: GitStep::RemoteAdd,
        benign: &["remote origin already exists"],
    },
    StepSpec {
        step: GitStep::ShowRef,
        benign: &[],
    },
    StepSpec {
        step: GitStep::Checkout,
        benign: &[],
    },
    StepSpec {
        step: GitStep::Pull,
        benign: &["couldn't find remote ref"],
    },
    StepSpec {
        step: GitStep::Push,
        benign: &[],
    },
];

impl GitStep {
    /// Returns the benign output patterns for this step.
    #[must_use]
    pub fn benign_patterns(self) -> &'static [&'static str] {
        GIT_STEPS
            .iter()
            .find(|spec| spec.step == self)
            .map(|spec| spec.benign)
            .unwrap_or_default()
    }

    /// Builds the argument list for this step.
    ///
    /// `value` is the commit message for [`GitStep::Commit`], the remote
    /// URL for [`GitStep::RemoteAdd`], and the branch for the branch
    /// steps. Other steps ignore it.
    #[must_use]
    pub fn args(self, value: &str) -> Vec<String> {
        let show_ref = format!("refs/heads/{value}");
        let args: Vec<&str> = match self {
            Self::Init => vec!["init"],
            Self::ConfigPull => vec!["config", "pull.rebase", "false"],
            Self::Add => vec!["add", "."],
            Self::Commit => vec!["commit", "-m", value],
            Self::RemoteAdd => vec!["remote", "add", "origin", value],
            Self::ShowRef => vec!["show-ref", "--verify", "--quiet", &show_ref],
            Self::Checkout => vec!["checkout", "-b", value],
            Self::Pull => vec![
                "pull",
                "origin",
                value,
                "--allow-unrelated-histories",
                "--no-ff",
            ],
            Self::Push => vec!["push", "origin", value],
        };
        args.into_iter().map(str::to_owned).collect()
    }
}

impl fmt::Display for GitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ConfigPull => "config",
            Self::Add => "add",
            Self::Commit => "commit",
            Self::RemoteAdd => "remote add",
            Self::ShowRef => "show-ref",
            Self::Checkout => "checkout",
            Self::Pull => "pull",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// Exit status and combined output of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    /// Whether git exited with status zero.
    pub success: bool,
    /// stdout followed by stderr.
    pub output: String,
}

impl GitOutput {
    /// A successful invocation with the given output.
    #[must_use]
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    /// A failed invocation with the given output.
    #[must_use]
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Exited successfully.
    Done,
    /// Failed with a benign output; the matched pattern is attached.
    Benign(&'static str),
    /// Failed for any other reason.
    Failed,
}

/// Classifies one step's result against its benign patterns.
///
/// A successful exit whose output matches a benign pattern is reported as
/// benign too, so `git init` on an existing repository is visible in logs.
#[must_use]
pub fn classify(step: GitStep, output: &GitOutput) -> StepOutcome {
    let benign = step
        .benign_patterns()
        .iter()
        .copied()
        .find(|pattern| output.output.contains(pattern));
    match (output.success, benign) {
        (_, Some(pattern)) => StepOutcome::Benign(pattern),
        (true, None) => StepOutcome::Done,
        (false, None) => StepOutcome::Failed,
    }
}

/// Runs git in a working directory.
pub trait GitRunner {
    /// Runs `git <args>` in `cwd`.
    fn run(&self, cwd: &Utf8Path, args: &[String]) -> std::io::Result<GitOutput>;
}

/// Runs the system `git` binary, never prompting for credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, cwd: &Utf8Path, args: &[String]) -> std::io::Result<GitOutput> {
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(GitOutput {
            success: output.status.success(),
            output: combined.trim().to_owned(),
        })
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// Replays canned outputs and records the argument lists it saw.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedGit {
        replies: Mutex<VecDeque<(String, GitOutput)>>,
        pub(crate) calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedGit {
        /// Queues a reply for the next call whose first argument is `verb`.
        pub(crate) fn reply(self, verb: &str, output: GitOutput) -> Self {
            self.replies.lock().push_back((verb.to_owned(), output));
            self
        }

        pub(crate) fn verbs(&self) -> Vec<String> {
            self.calls
                .lock()
                .iter()
                .map(|args| args.first().cloned().unwrap_or_default())
                .collect()
        }
    }

    impl GitRunner for ScriptedGit {
        fn run(&self, _cwd: &Utf8Path, args: &[String]) -> std::io::Result<GitOutput> {
            self.calls.lock().push(args.to_vec());
            let verb = args.first().map(String::as_str).unwrap_or_default();
            let mut replies = self.replies.lock();
            let position = replies.iter().position(|(v, _)| v == verb);
            Ok(position
                .and_then(|i| replies.remove(i))
                .map_or_else(|| GitOutput::ok(""), |(_, output)| output))
        }
    }
}
