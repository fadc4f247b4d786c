// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`action`] defines the actions rules can carry.
//! - [`backend`] provides the `ActionInvoker` trait the scheduler talks to,
//!   so tests can replace process execution with a fake.
//! - [`process`] is the production invoker built on `tokio::process`.
//! - [`env`] computes the variables and working directory of each action.
//! - [`deploy`] implements the default deployment copy.

pub mod action;
pub mod backend;
pub mod deploy;
pub mod env;
pub mod process;

pub use action::{Action, CommandAction, DeployCopyAction, VcsAction, VcsKind, VcsOperation};
pub use backend::{ActionInvoker, ActionOutcome, DryRunInvoker, ScheduledAction};
pub use env::{environment_for, EnvironmentLayer};
pub use process::ProcessInvoker;
