// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::exec::Action;
use crate::label::Label;

/// Per-node data that does not belong on the petgraph node itself.
#[derive(Debug, Clone, Default)]
struct NodeInfo {
    /// Concatenated actions of every rule matching the label.
    actions: Vec<Action>,
    /// False for leaves: labels no rule produces.
    has_rules: bool,
}

/// Concrete dependency graph for one command.
///
/// Edge direction: dependency -> dependent. For
/// `package:a/built <- checkout:a/checked_out` there is an edge from the
/// checkout label to the package label.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Label, ()>,
    index: HashMap<Label, NodeIndex>,
    info: Vec<NodeInfo>,
    roots: BTreeSet<Label>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `label` if it is not present yet and return its node.
    pub fn add_node(&mut self, label: &Label) -> NodeIndex {
        if let Some(&idx) = self.index.get(label) {
            return idx;
        }
        let idx = self.graph.add_node(label.clone());
        self.index.insert(label.clone(), idx);
        self.info.push(NodeInfo::default());
        idx
    }

    /// Record that `dependent` cannot be reached before `dependency`.
    pub fn add_edge(&mut self, dependency: &Label, dependent: &Label) {
        let from = self.add_node(dependency);
        let to = self.add_node(dependent);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    pub(crate) fn set_rules(&mut self, label: &Label, actions: Vec<Action>, has_rules: bool) {
        let idx = self.add_node(label);
        self.info[idx.index()] = NodeInfo { actions, has_rules };
    }

    pub(crate) fn add_root(&mut self, label: &Label) {
        self.add_node(label);
        self.roots.insert(label.clone());
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.index.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The requested targets this graph was expanded from, in label order.
    pub fn roots(&self) -> impl Iterator<Item = &Label> {
        self.roots.iter()
    }

    /// All labels, in label order.
    pub fn labels(&self) -> Vec<&Label> {
        let mut labels: Vec<&Label> = self.graph.node_weights().collect();
        labels.sort();
        labels
    }

    /// Direct dependencies of `label`, in label order.
    pub fn dependencies_of(&self, label: &Label) -> Vec<&Label> {
        self.neighbors(label, Direction::Incoming)
    }

    /// Direct dependents of `label`, in label order.
    pub fn dependents_of(&self, label: &Label) -> Vec<&Label> {
        self.neighbors(label, Direction::Outgoing)
    }

    pub fn actions_of(&self, label: &Label) -> &[Action] {
        self.index
            .get(label)
            .map(|idx| self.info[idx.index()].actions.as_slice())
            .unwrap_or(&[])
    }

    /// Is `label` externally provided (no rule produces it)?
    pub fn is_leaf(&self, label: &Label) -> bool {
        self.index
            .get(label)
            .is_none_or(|idx| !self.info[idx.index()].has_rules)
    }

    /// Labels in post-order: every label after all of its dependencies.
    /// Roots and dependencies are visited in label order.
    pub fn post_order(&self) -> Vec<&Label> {
        let mut order = Vec::with_capacity(self.len());
        let mut visited: BTreeSet<&Label> = BTreeSet::new();

        for root in &self.roots {
            // (label, dependencies already pushed)
            let mut stack: Vec<(&Label, bool)> = vec![(root, false)];
            while let Some((label, expanded)) = stack.pop() {
                if expanded {
                    order.push(label);
                    continue;
                }
                if !visited.insert(label) {
                    continue;
                }
                stack.push((label, true));
                for dep in self.dependencies_of(label).into_iter().rev() {
                    if !visited.contains(dep) {
                        stack.push((dep, false));
                    }
                }
            }
        }

        order
    }

    fn neighbors(&self, label: &Label, dir: Direction) -> Vec<&Label> {
        let Some(&idx) = self.index.get(label) else {
            return Vec::new();
        };
        let mut out: Vec<&Label> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| &self.graph[n])
            .collect();
        out.sort();
        out
    }
}
