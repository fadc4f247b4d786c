// src/engine/query.rs

//! Read-only questions about a build tree.

use crate::dag::Target;
use crate::errors::Result;
use crate::label::Label;
use crate::rules::Rule;

use super::core::Engine;

/// What `query status` reports for one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStatus {
    pub label: Label,
    pub asserted: bool,
    /// No rule produces this label.
    pub leaf: bool,
    /// Direct dependencies, in label order.
    pub dependencies: Vec<Label>,
    /// Descriptions of the actions that would run, in order.
    pub actions: Vec<String>,
}

impl Engine {
    /// Known concrete labels matching `pattern`, in label order.
    ///
    /// System labels (`[S]`) are left out unless `pattern` is marked `[S]`
    /// too.
    pub fn labels_matching(&self, pattern: &Label) -> Vec<Label> {
        let rules = &self.registered.rules;
        let with_system = pattern.is_system();
        rules
            .expand(pattern)
            .iter()
            .filter_map(|l| rules.known_label(l))
            .filter(|l| with_system || !l.is_system())
            .cloned()
            .collect()
    }

    pub fn status_of(&self, label: &Label) -> LabelStatus {
        let resolved = self.registered.rules.resolve(label);
        LabelStatus {
            label: label.clone(),
            asserted: self.store.is_asserted(label),
            leaf: resolved.rule_count == 0,
            dependencies: resolved.deps.into_iter().collect(),
            actions: resolved.actions.iter().map(|a| a.describe()).collect(),
        }
    }

    /// Labels a build of `targets` would invoke actions for, in run order.
    pub async fn needed_to_build(&self, targets: &[Target]) -> Result<Vec<Label>> {
        Ok(self.simulate(targets, false, false).await?.invoked)
    }

    /// Known labels that depend, directly or not, on anything matching
    /// `label`.
    pub fn required_by(&self, label: &Label) -> Vec<Label> {
        self.registered.rules.required_by(label).into_iter().collect()
    }

    /// Registered rules whose target matches `pattern` (all rules if `None`),
    /// in registration order.
    pub fn rules_matching(&self, pattern: Option<&Label>) -> Vec<&Rule> {
        self.registered
            .rules
            .rules()
            .iter()
            .filter(|r| pattern.is_none_or(|p| r.target.matches(p)))
            .collect()
    }
}
