// src/rules/index.rs

//! Index of every concrete label the rule database has seen.

use std::collections::{BTreeSet, HashMap};

use crate::label::Label;

/// Concrete labels bucketed by kind and by (kind, tag).
///
/// Updated on every rule registration so that wildcard expansion only scans
/// the narrowest bucket a pattern allows instead of every rule.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    all: BTreeSet<Label>,
    by_kind: HashMap<String, BTreeSet<Label>>,
    by_kind_tag: HashMap<(String, String), BTreeSet<Label>>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a label. Non-concrete labels are ignored.
    pub fn insert(&mut self, label: &Label) {
        if !label.is_concrete() || self.all.contains(label) {
            return;
        }

        if let (Some(kind), Some(tag)) = (label.kind().as_literal(), label.tag().as_literal()) {
            self.by_kind
                .entry(kind.to_string())
                .or_default()
                .insert(label.clone());
            self.by_kind_tag
                .entry((kind.to_string(), tag.to_string()))
                .or_default()
                .insert(label.clone());
        }
        self.all.insert(label.clone());
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.all.contains(label)
    }

    /// The label as first recorded, flags included.
    pub fn get(&self, label: &Label) -> Option<&Label> {
        self.all.get(label)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.all.iter()
    }

    /// Labels that could match `pattern`, in label order. The caller still
    /// has to run [`Label::matches`] on each of them.
    pub fn candidates<'a>(&'a self, pattern: &Label) -> impl Iterator<Item = &'a Label> + use<'a> {
        let bucket = match (pattern.kind().as_literal(), pattern.tag().as_literal()) {
            (Some(kind), Some(tag)) => self
                .by_kind_tag
                .get(&(kind.to_string(), tag.to_string())),
            (Some(kind), None) => self.by_kind.get(kind),
            _ => Some(&self.all),
        };
        bucket.into_iter().flatten()
    }
}
