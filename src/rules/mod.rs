// src/rules/mod.rs

//! Rule database: target patterns, their dependencies and their actions.
//!
//! The database is append-only. There is no registry of names: the set of
//! concrete labels that wildcards can expand to is whatever has appeared as a
//! concrete target or dependency of some rule, tracked by [`LabelIndex`].

pub mod index;

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use tracing::{debug, trace};

use crate::errors::{MuddleError, Result};
use crate::exec::Action;
use crate::label::Label;

pub use index::LabelIndex;

/// A target label (possibly wildcarded), the labels it depends on, and the
/// action that produces it.
#[derive(Debug, Clone)]
pub struct Rule {
    pub target: Label,
    /// Dependencies in registration order, without duplicates.
    pub deps: Vec<Label>,
    pub action: Option<Action>,
}

impl Rule {
    pub fn new(target: Label, action: Option<Action>) -> Self {
        Self {
            target,
            deps: Vec::new(),
            action,
        }
    }

    /// Add a dependency. Adding the same label twice is a no-op.
    pub fn depend_on(mut self, dep: Label) -> Self {
        self.add(dep);
        self
    }

    pub fn add(&mut self, dep: Label) {
        if !self.deps.contains(&dep) {
            self.deps.push(dep);
        }
    }
}

/// The direct inputs of one concrete label, gathered from every rule whose
/// target matches it.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    /// Concrete dependencies (union over all matching rules).
    pub deps: BTreeSet<Label>,
    /// Actions of the matching rules, in registration order.
    pub actions: Vec<Action>,
    /// Number of rules that matched.
    pub rule_count: usize,
}

/// All registered rules plus an index of the concrete labels they mention.
#[derive(Debug, Clone, Default)]
pub struct RuleDatabase {
    rules: Vec<Rule>,
    /// Rules with a concrete target, keyed by that target.
    exact: HashMap<Label, Vec<usize>>,
    /// Rules whose target contains a wildcard.
    patterned: Vec<usize>,
    index: LabelIndex,
}

impl RuleDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Rules can never be removed.
    pub fn add_rule(&mut self, rule: Rule) {
        let idx = self.rules.len();

        self.index.insert(&rule.target);
        for dep in &rule.deps {
            self.index.insert(dep);
        }

        if rule.target.is_concrete() {
            self.exact.entry(rule.target.clone()).or_default().push(idx);
        } else {
            self.patterned.push(idx);
        }

        trace!(label = %rule.target, deps = rule.deps.len(), "registered rule");
        self.rules.push(rule);
    }

    /// Register `target <- dep` without an action.
    pub fn add_dependency(&mut self, target: Label, dep: Label) {
        self.add_rule(Rule::new(target, None).depend_on(dep));
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every concrete label mentioned anywhere, in label order.
    pub fn all_labels(&self) -> impl Iterator<Item = &Label> {
        self.index.iter()
    }

    /// Has `label` appeared as a concrete target or dependency?
    pub fn is_known(&self, label: &Label) -> bool {
        self.index.contains(label)
    }

    /// The registered form of a known label, with the flags it was first
    /// mentioned with.
    pub fn known_label(&self, label: &Label) -> Option<&Label> {
        self.index.get(label)
    }

    /// Rules whose target matches the concrete `label`, in registration
    /// order.
    pub fn rules_for(&self, label: &Label) -> Vec<&Rule> {
        let mut idxs: Vec<usize> = self.exact.get(label).cloned().unwrap_or_default();
        idxs.extend(
            self.patterned
                .iter()
                .copied()
                .filter(|&i| label.matches(&self.rules[i].target)),
        );
        idxs.sort_unstable();
        idxs.into_iter().map(|i| &self.rules[i]).collect()
    }

    pub fn has_rules(&self, label: &Label) -> bool {
        !self.rules_for(label).is_empty()
    }

    /// A leaf is a label nothing produces; it is treated as externally
    /// satisfied.
    pub fn is_leaf(&self, label: &Label) -> bool {
        !self.has_rules(label)
    }

    /// Expand `pattern` into the concrete labels it denotes.
    ///
    /// A concrete pattern expands to itself, whether or not it is known.
    pub fn expand(&self, pattern: &Label) -> BTreeSet<Label> {
        if pattern.is_concrete() {
            return BTreeSet::from([pattern.clone()]);
        }
        self.index
            .candidates(pattern)
            .filter(|l| l.matches(pattern))
            .cloned()
            .collect()
    }

    /// Expand a target requested by a user.
    ///
    /// Unlike [`RuleDatabase::expand`], this fails with `NoRules` if a
    /// concrete target is unknown or a wildcard expands to nothing.
    pub fn expand_target(&self, pattern: &Label) -> Result<BTreeSet<Label>> {
        if pattern.is_concrete() {
            if !self.is_known(pattern) && !self.has_rules(pattern) {
                return Err(MuddleError::NoRules(format!(
                    "no rule builds {pattern} and nothing depends on it"
                )));
            }
            return Ok(BTreeSet::from([pattern.clone()]));
        }

        let expanded = self.expand(pattern);
        if expanded.is_empty() {
            return Err(MuddleError::NoRules(format!(
                "{pattern} does not match any known label"
            )));
        }
        Ok(expanded)
    }

    /// Collect the concrete dependencies and actions of `label`.
    ///
    /// Dependencies of every matching rule are substituted relative to
    /// `label` and then expanded; wildcards that match nothing contribute
    /// nothing.
    pub fn resolve(&self, label: &Label) -> Resolved {
        let mut resolved = Resolved::default();

        for rule in self.rules_for(label) {
            resolved.rule_count += 1;
            for dep in &rule.deps {
                let dep = dep.substitute_from(&rule.target, label);
                let expanded = self.expand(&dep);
                if expanded.is_empty() {
                    debug!(
                        label = %label,
                        dep = %dep,
                        "wildcard dependency matches no known label"
                    );
                }
                resolved.deps.extend(expanded);
            }
            if let Some(action) = &rule.action {
                resolved.actions.push(action.clone());
            }
        }

        resolved
    }

    /// Every known label that depends, directly or indirectly, on `label`.
    ///
    /// Returned in label order.
    pub fn required_by(&self, label: &Label) -> BTreeSet<Label> {
        self.required_by_any(std::slice::from_ref(label))
    }

    /// Every known label that depends, directly or indirectly, on anything
    /// matching one of `labels`.
    pub fn required_by_any(&self, labels: &[Label]) -> BTreeSet<Label> {
        let mut dependents: BTreeMap<Label, Vec<Label>> = BTreeMap::new();
        for candidate in self.all_labels() {
            for dep in self.resolve(candidate).deps {
                dependents.entry(dep).or_default().push(candidate.clone());
            }
        }

        let mut result = BTreeSet::new();
        let mut queue: VecDeque<Label> = labels
            .iter()
            .flat_map(|l| self.expand(l))
            .collect();

        while let Some(current) = queue.pop_front() {
            for dependent in dependents.get(&current).into_iter().flatten() {
                if result.insert(dependent.clone()) {
                    queue.push_back(dependent.clone());
                }
            }
        }

        result
    }
}
