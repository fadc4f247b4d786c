// src/exec/process.rs

//! Runs scheduled actions as child processes.

use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::action::{Action, DeployCopyAction, VcsAction};
use super::backend::{ActionInvoker, ActionOutcome, ScheduledAction};
use super::deploy;

/// How many trailing stderr lines are kept as failure diagnostics.
const DIAGNOSTIC_LINES: usize = 40;

/// Production invoker: shell commands and `git` via `tokio::process`,
/// deployment copies on the blocking pool.
#[derive(Debug, Default)]
pub struct ProcessInvoker {
    _private: (),
}

impl ProcessInvoker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActionInvoker for ProcessInvoker {
    fn invoke(
        &mut self,
        scheduled: ScheduledAction,
    ) -> Pin<Box<dyn Future<Output = crate::errors::Result<ActionOutcome>> + Send + '_>> {
        Box::pin(async move { Ok(run_scheduled(&scheduled).await) })
    }
}

/// Run every action of `scheduled` in order, stopping at the first failure.
pub async fn run_scheduled(scheduled: &ScheduledAction) -> ActionOutcome {
    if scheduled.actions.is_empty() {
        debug!(label = %scheduled.label, "no action to run");
        return ActionOutcome::Success;
    }

    for action in &scheduled.actions {
        let outcome = match run_action(scheduled, action).await {
            Ok(outcome) => outcome,
            Err(err) => ActionOutcome::Failed {
                code: -1,
                diagnostics: format!("{err:#}"),
            },
        };
        if !outcome.is_success() {
            return outcome;
        }
    }
    ActionOutcome::Success
}

async fn run_action(scheduled: &ScheduledAction, action: &Action) -> Result<ActionOutcome> {
    info!(label = %scheduled.label, action = %action, "running action");

    match action {
        Action::Command(c) => {
            prepare_work_dir(&scheduled.work_dir).await?;
            let mut cmd = shell(&c.command);
            cmd.current_dir(&scheduled.work_dir);
            run_process(scheduled, cmd, &c.command).await
        }
        Action::Vcs(vcs) => run_vcs(scheduled, vcs).await,
        Action::DeployCopy(copy) => run_deploy_copy(copy).await,
    }
}

async fn run_vcs(scheduled: &ScheduledAction, vcs: &VcsAction) -> Result<ActionOutcome> {
    let Some(argv) = vcs.argv() else {
        debug!(label = %scheduled.label, "checkout has no version control; nothing to do");
        return Ok(ActionOutcome::Success);
    };
    if let Some(parent) = vcs.directory.parent() {
        prepare_work_dir(parent).await?;
    }

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]).current_dir(tree_root(scheduled));
    run_process(scheduled, cmd, &argv.join(" ")).await
}

async fn run_deploy_copy(copy: &DeployCopyAction) -> Result<ActionOutcome> {
    let sources = copy.sources.clone();
    let destination = copy.destination.clone();
    let copied = tokio::task::spawn_blocking(move || deploy::copy_trees(&sources, &destination))
        .await
        .context("joining deployment copy")?
        .with_context(|| format!("copying install trees to {}", copy.destination.display()))?;
    info!(files = copied, destination = %copy.destination.display(), "deployment copied");
    Ok(ActionOutcome::Success)
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

async fn prepare_work_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating directory {}", dir.display()))
}

async fn run_process(
    scheduled: &ScheduledAction,
    mut cmd: Command,
    shown: &str,
) -> Result<ActionOutcome> {
    cmd.envs(&scheduled.env)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for {}: {shown}", scheduled.label))?;

    // Echo stderr as it arrives and keep the tail for diagnostics.
    let tail = match child.stderr.take() {
        Some(stderr) => {
            let label = scheduled.label.to_string();
            Some(tokio::spawn(async move {
                let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_LINES);
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    eprintln!("{line}");
                    debug!(label = %label, "stderr: {}", line);
                    if tail.len() == DIAGNOSTIC_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                tail
            }))
        }
        None => None,
    };

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of {}", scheduled.label))?;

    let diagnostics = match tail {
        Some(handle) => match handle.await {
            Ok(lines) => Vec::from(lines).join("\n"),
            Err(e) => {
                warn!(label = %scheduled.label, error = %e, "stderr reader failed");
                String::new()
            }
        },
        None => String::new(),
    };

    let code = status.code().unwrap_or(-1);
    info!(
        label = %scheduled.label,
        exit_code = code,
        success = status.success(),
        "action process exited"
    );

    if status.success() {
        Ok(ActionOutcome::Success)
    } else {
        let diagnostics = if diagnostics.is_empty() {
            format!("`{shown}` exited with status {code}")
        } else {
            diagnostics
        };
        Ok(ActionOutcome::Failed { code, diagnostics })
    }
}

/// Tree root as exported to the action, falling back to the work dir.
fn tree_root(scheduled: &ScheduledAction) -> &Path {
    scheduled
        .env
        .get("MUDDLE_ROOT")
        .map(Path::new)
        .unwrap_or(scheduled.work_dir.as_path())
}
