// src/dag/scheduler.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::node_state::{NodeState, NodeStates};
use crate::dag::report::BuildReport;
use crate::errors::{MuddleError, Result};
use crate::exec::{ActionInvoker, ActionOutcome, EnvironmentLayer};
use crate::label::Label;
use crate::tags::TagStore;

/// Brings every label of a [`DependencyGraph`] into its asserted state.
///
/// It is responsible for:
/// - visiting labels dependencies-first, roots and deps in label order
/// - skipping labels that are asserted and whose dependencies did not change
/// - invoking actions for everything else, one at a time
/// - asserting each label as soon as its action succeeds
/// - stopping at the first failure or interrupt
pub struct Scheduler<'a> {
    graph: &'a DependencyGraph,
    store: &'a mut dyn TagStore,
    env: &'a EnvironmentLayer,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        graph: &'a DependencyGraph,
        store: &'a mut dyn TagStore,
        env: &'a EnvironmentLayer,
    ) -> Self {
        Self {
            graph,
            store,
            env,
            interrupt: None,
        }
    }

    /// Check `flag` before every action and stop once it is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Run to completion.
    ///
    /// On failure the labels asserted so far stay asserted and are carried
    /// in the error; the failing label and everything not yet visited stay
    /// unasserted.
    pub async fn run(mut self, invoker: &mut dyn ActionInvoker) -> Result<BuildReport> {
        let graph = self.graph;
        let mut states = NodeStates::new();
        let mut report = BuildReport::default();

        for label in graph.post_order() {
            states.set(label, NodeState::Visiting);

            if self.is_satisfied(label, &states) {
                states.set(label, NodeState::Satisfied);
                report.satisfied.push(label.clone());
                continue;
            }

            states.set(label, NodeState::NeedsAction);
            // Out of date until its action succeeds, even if asserted before.
            self.store.retract(label)?;
            if self.interrupted() {
                warn!(label = %label, "interrupted before running action");
                return Err(MuddleError::Interrupted {
                    asserted: report.asserted,
                });
            }

            let scheduled = self.env.schedule(label, graph.actions_of(label).to_vec());
            report.invoked.push(label.clone());
            info!(label = %label, actions = scheduled.actions.len(), "building");

            let outcome = match invoker.invoke(scheduled).await {
                Ok(outcome) => outcome,
                Err(err) => ActionOutcome::Failed {
                    code: -1,
                    diagnostics: err.to_string(),
                },
            };

            match outcome {
                ActionOutcome::Success => {
                    self.store.assert(label)?;
                    states.set(label, NodeState::Done);
                    report.asserted.push(label.clone());
                }
                ActionOutcome::Failed { code, diagnostics } => {
                    warn!(label = %label, code, "action failed");
                    return Err(MuddleError::ActionFailed {
                        label: label.clone(),
                        diagnostics,
                        asserted: report.asserted,
                    });
                }
            }
        }

        debug!(
            asserted = report.asserted.len(),
            satisfied = report.satisfied.len(),
            "scheduler finished"
        );
        Ok(report)
    }

    fn is_satisfied(&self, label: &Label, states: &NodeStates) -> bool {
        if self.graph.is_leaf(label) {
            return true;
        }
        if !self.store.is_asserted(label) {
            return false;
        }
        !self
            .graph
            .dependencies_of(label)
            .into_iter()
            .any(|dep| states.is_fresh(dep))
    }
}
