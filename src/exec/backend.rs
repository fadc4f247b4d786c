// src/exec/backend.rs

//! Pluggable action invoker abstraction.
//!
//! The scheduler never runs anything itself. It hands each label that needs
//! work to an [`ActionInvoker`] and waits for the outcome. This keeps the
//! scheduling rules testable with a fake invoker while production uses
//! [`ProcessInvoker`](super::ProcessInvoker).
//!
//! - [`DryRunInvoker`] backs `--just-print` and planning queries: it
//!   reports what would run and pretends it succeeded.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::Result;
use crate::label::Label;

use super::action::Action;

/// Everything needed to bring one label into its required state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAction {
    pub label: Label,
    /// Actions of every rule matching `label`, in registration order. May be
    /// empty, in which case invoking it is a no-op.
    pub actions: Vec<Action>,
    pub env: BTreeMap<String, String>,
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failed { code: i32, diagnostics: String },
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }
}

/// Trait abstracting how scheduled actions are carried out.
pub trait ActionInvoker: Send {
    /// Run the actions for one label and report how it went.
    ///
    /// An `Err` means the invoker itself broke; the scheduler treats it like
    /// a failed action.
    fn invoke(
        &mut self,
        action: ScheduledAction,
    ) -> Pin<Box<dyn Future<Output = Result<ActionOutcome>> + Send + '_>>;
}

/// Stands in for a real invoker during `--just-print` and planning
/// queries: every action "succeeds" without running.
#[derive(Debug, Default)]
pub struct DryRunInvoker {
    echo: bool,
}

impl DryRunInvoker {
    /// Print each label and its actions to stdout.
    pub fn printing() -> Self {
        Self { echo: true }
    }

    pub fn silent() -> Self {
        Self { echo: false }
    }
}

impl ActionInvoker for DryRunInvoker {
    fn invoke(
        &mut self,
        action: ScheduledAction,
    ) -> Pin<Box<dyn Future<Output = Result<ActionOutcome>> + Send + '_>> {
        let echo = self.echo;
        Box::pin(async move {
            if echo {
                println!("{}", action.label);
                for a in &action.actions {
                    println!("    {}", a.describe());
                }
            }
            Ok(ActionOutcome::Success)
        })
    }
}
