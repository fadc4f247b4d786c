// src/tags/memory.rs

use std::collections::BTreeSet;

use tracing::debug;

use super::{ensure_concrete, TagStore};
use crate::errors::Result;
use crate::label::Label;

/// Stores assertions in memory only (lost on exit).
#[derive(Debug, Clone, Default)]
pub struct MemoryTagStore {
    asserted: BTreeSet<Label>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `labels`.
    pub fn with_asserted<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Label>,
    {
        Self {
            asserted: labels.into_iter().collect(),
        }
    }
}

impl TagStore for MemoryTagStore {
    fn assert(&mut self, label: &Label) -> Result<()> {
        ensure_concrete(label)?;
        if self.asserted.insert(label.clone()) {
            debug!(label = %label, "asserted (memory)");
        }
        Ok(())
    }

    fn is_asserted(&self, label: &Label) -> bool {
        self.asserted.contains(label)
    }

    fn retract(&mut self, label: &Label) -> Result<()> {
        ensure_concrete(label)?;
        if self.asserted.remove(label) {
            debug!(label = %label, "retracted (memory)");
        }
        Ok(())
    }

    fn retract_all_matching(&mut self, pattern: &Label) -> Result<Vec<Label>> {
        let matching: Vec<Label> = self
            .asserted
            .iter()
            .filter(|l| l.matches(pattern))
            .cloned()
            .collect();
        for label in &matching {
            self.asserted.remove(label);
        }
        Ok(matching)
    }

    fn asserted_labels(&self) -> Result<Vec<Label>> {
        Ok(self.asserted.iter().cloned().collect())
    }
}
