// src/dag/node_state.rs

//! Per-run state of graph nodes.

use std::collections::HashMap;

use tracing::trace;

use crate::label::Label;

/// Where a node is in the current run.
///
/// `Unvisited -> Visiting -> {Satisfied | NeedsAction} -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unvisited,
    /// Dependencies are being brought up to date.
    Visiting,
    /// Already asserted and nothing below it changed; no action needed.
    Satisfied,
    /// Its action is about to run.
    NeedsAction,
    /// Action ran and the label was asserted during this run.
    Done,
}

impl NodeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Satisfied | NodeState::Done)
    }
}

/// Tracks [`NodeState`] per label. Labels never seen are `Unvisited`.
#[derive(Debug, Default)]
pub struct NodeStates {
    states: HashMap<Label, NodeState>,
}

impl NodeStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &Label) -> NodeState {
        self.states
            .get(label)
            .copied()
            .unwrap_or(NodeState::Unvisited)
    }

    pub fn set(&mut self, label: &Label, state: NodeState) {
        trace!(label = %label, ?state, "node state");
        self.states.insert(label.clone(), state);
    }

    /// Was `label` freshly asserted in this run?
    ///
    /// A dependent of a fresh node is never satisfied.
    pub fn is_fresh(&self, label: &Label) -> bool {
        self.get(label) == NodeState::Done
    }
}
