// src/dag/expand.rs

//! Turns requested targets into a concrete [`DependencyGraph`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::dag::aggregate::{Aggregate, AggregateTable};
use crate::dag::graph::DependencyGraph;
use crate::errors::{MuddleError, Result};
use crate::label::Label;
use crate::rules::RuleDatabase;

/// Something a user can ask to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Label(Label),
    Aggregate(Aggregate),
}

impl FromStr for Target {
    type Err = MuddleError;

    fn from_str(text: &str) -> Result<Self> {
        if let Some(aggregate) = Aggregate::parse(text) {
            return Ok(Target::Aggregate(aggregate));
        }
        Label::parse(text).map(Target::Label)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Label(l) => fmt::Display::fmt(l, f),
            Target::Aggregate(a) => fmt::Display::fmt(a, f),
        }
    }
}

impl From<Label> for Target {
    fn from(label: Label) -> Self {
        Target::Label(label)
    }
}

/// Expand targets into the concrete labels they denote.
pub fn concrete_targets(
    targets: &[Target],
    db: &RuleDatabase,
    aggregates: &AggregateTable,
) -> Result<BTreeSet<Label>> {
    let mut labels = BTreeSet::new();
    for target in targets {
        let expanded = match target {
            Target::Label(l) => db.expand_target(l)?,
            Target::Aggregate(a) => aggregates.resolve(a, db)?,
        };
        debug!(requested = %target, count = expanded.len(), "expanded target");
        labels.extend(expanded);
    }
    Ok(labels)
}

/// Build the dependency closure of `roots`.
///
/// Traversal is depth-first from each root in label order. Reaching a label
/// that is still on the current path is a cycle and fails with the full
/// path, e.g. `a -> b -> a`.
pub fn build_graph(roots: &BTreeSet<Label>, db: &RuleDatabase) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    let mut done: HashSet<Label> = HashSet::new();

    for root in roots {
        graph.add_root(root);
        let mut path: Vec<Label> = Vec::new();
        visit(root, db, &mut graph, &mut done, &mut path)?;
    }

    debug!(nodes = graph.len(), roots = roots.len(), "dependency graph built");
    Ok(graph)
}

fn visit(
    label: &Label,
    db: &RuleDatabase,
    graph: &mut DependencyGraph,
    done: &mut HashSet<Label>,
    path: &mut Vec<Label>,
) -> Result<()> {
    if let Some(pos) = path.iter().position(|l| l == label) {
        let cycle: Vec<String> = path[pos..]
            .iter()
            .chain(std::iter::once(label))
            .map(ToString::to_string)
            .collect();
        return Err(MuddleError::CyclicDependency(cycle.join(" -> ")));
    }
    if done.contains(label) {
        return Ok(());
    }

    let resolved = db.resolve(label);
    trace!(
        label = %label,
        rules = resolved.rule_count,
        deps = resolved.deps.len(),
        "resolved"
    );
    graph.set_rules(label, resolved.actions, resolved.rule_count > 0);

    path.push(label.clone());
    for dep in &resolved.deps {
        graph.add_edge(dep, label);
        visit(dep, db, graph, done, path)?;
    }
    path.pop();

    done.insert(label.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Action;
    use crate::rules::Rule;

    fn label(s: &str) -> Label {
        Label::parse(s).unwrap()
    }

    #[test]
    fn targets_parse_as_labels_or_aggregates() {
        assert!(matches!(
            "_all{x86}".parse::<Target>(),
            Ok(Target::Aggregate(_))
        ));
        assert!(matches!(
            "package:a/built".parse::<Target>(),
            Ok(Target::Label(_))
        ));
        assert!("_secret:a/built".parse::<Target>().is_err());
    }

    #[test]
    fn closure_follows_rules_and_records_actions() {
        let mut db = RuleDatabase::new();
        db.add_rule(
            Rule::new(label("package:a/built"), Some(Action::command("make")))
                .depend_on(label("checkout:a/checked_out")),
        );
        db.add_dependency(label("package:a/installed"), label("package:a/built"));

        let roots = BTreeSet::from([label("package:a/installed")]);
        let graph = build_graph(&roots, &db).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.actions_of(&label("package:a/built")).len(), 1);
        assert!(graph.is_leaf(&label("checkout:a/checked_out")));
        assert!(!graph.is_leaf(&label("package:a/installed")));
    }

    #[test]
    fn cycles_report_the_full_path() {
        let mut db = RuleDatabase::new();
        db.add_dependency(label("package:a/built"), label("package:b/built"));
        db.add_dependency(label("package:b/built"), label("package:a/built"));

        let roots = BTreeSet::from([label("package:a/built")]);
        match build_graph(&roots, &db) {
            Err(MuddleError::CyclicDependency(text)) => {
                assert_eq!(text, "package:a/built -> package:b/built -> package:a/built");
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn diamonds_are_not_cycles() {
        let mut db = RuleDatabase::new();
        db.add_dependency(label("package:top/built"), label("package:l/built"));
        db.add_dependency(label("package:top/built"), label("package:r/built"));
        db.add_dependency(label("package:l/built"), label("checkout:base/checked_out"));
        db.add_dependency(label("package:r/built"), label("checkout:base/checked_out"));

        let roots = BTreeSet::from([label("package:top/built")]);
        let graph = build_graph(&roots, &db).unwrap();
        assert_eq!(graph.len(), 4);
    }
}
