// src/exec/action.rs

//! The things a rule can ask muddle to do.
//!
//! Every action kind is a variant of [`Action`]; the scheduler never looks
//! inside them and hands them to an [`ActionInvoker`](super::ActionInvoker)
//! together with the label being built.

use std::fmt;
use std::path::PathBuf;

/// A single opaque action bound to a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run a shell command.
    Command(CommandAction),
    /// Talk to a version control system on behalf of a checkout.
    Vcs(VcsAction),
    /// Copy role install trees into a deployment directory.
    DeployCopy(DeployCopyAction),
}

impl Action {
    pub fn command(cmd: impl Into<String>) -> Self {
        Action::Command(CommandAction {
            command: cmd.into(),
        })
    }

    /// Short human-readable summary, used by `--just-print` and logging.
    pub fn describe(&self) -> String {
        match self {
            Action::Command(c) => format!("sh -c {:?}", c.command),
            Action::Vcs(v) => format!(
                "{} {} {} -> {}",
                v.vcs,
                v.operation,
                v.repo,
                v.directory.display()
            ),
            Action::DeployCopy(d) => format!(
                "copy {} install tree(s) -> {}",
                d.sources.len(),
                d.destination.display()
            ),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAction {
    pub command: String,
}

/// Supported version control systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    #[default]
    Git,
    /// Source is already in place; checking out is a no-op.
    None,
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsKind::Git => f.write_str("git"),
            VcsKind::None => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsOperation {
    /// Initial fetch of the repository.
    Checkout,
    /// Bring an existing checkout up to date.
    Pull,
    /// Merge upstream changes into the local tree.
    Merge,
}

impl fmt::Display for VcsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsOperation::Checkout => f.write_str("checkout"),
            VcsOperation::Pull => f.write_str("pull"),
            VcsOperation::Merge => f.write_str("merge"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsAction {
    pub vcs: VcsKind,
    pub operation: VcsOperation,
    pub repo: String,
    pub branch: Option<String>,
    /// Absolute checkout directory.
    pub directory: PathBuf,
}

impl VcsAction {
    /// Program and arguments realising this operation.
    ///
    /// Returns `None` when there is nothing to run (`vcs = "none"`). A
    /// checkout whose directory is already a clone fetches instead of
    /// cloning again.
    pub fn argv(&self) -> Option<Vec<String>> {
        if self.vcs == VcsKind::None {
            return None;
        }

        let dir = self.directory.to_string_lossy().into_owned();
        let argv = match self.operation {
            VcsOperation::Checkout if self.directory.join(".git").exists() => vec![
                "git".to_string(),
                "-C".to_string(),
                dir,
                "fetch".to_string(),
            ],
            VcsOperation::Checkout => {
                let mut argv = vec!["git".to_string(), "clone".to_string()];
                if let Some(branch) = &self.branch {
                    argv.push("--branch".to_string());
                    argv.push(branch.clone());
                }
                argv.push(self.repo.clone());
                argv.push(dir);
                argv
            }
            VcsOperation::Pull => vec![
                "git".to_string(),
                "-C".to_string(),
                dir,
                "pull".to_string(),
                "--ff-only".to_string(),
            ],
            VcsOperation::Merge => vec![
                "git".to_string(),
                "-C".to_string(),
                dir,
                "pull".to_string(),
                "--no-edit".to_string(),
            ],
        };
        Some(argv)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployCopyAction {
    /// Install trees to merge, in order; later sources overwrite earlier ones.
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
}
