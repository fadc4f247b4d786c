// src/dag/mod.rs

//! Concrete dependency graphs and their scheduling.
//!
//! - [`expand`] turns requested targets into a [`DependencyGraph`].
//! - [`aggregate`] resolves named targets such as `_all`.
//! - [`graph`] holds the petgraph-backed graph of labels.
//! - [`scheduler`] walks the graph and invokes actions.
//! - [`node_state`] tracks per-run node states.
//! - [`report`] describes what a run did.

pub mod aggregate;
pub mod expand;
pub mod graph;
pub mod node_state;
pub mod report;
pub mod scheduler;

pub use aggregate::{Aggregate, AggregateTable};
pub use expand::{build_graph, concrete_targets, Target};
pub use graph::DependencyGraph;
pub use node_state::NodeState;
pub use report::BuildReport;
pub use scheduler::Scheduler;
