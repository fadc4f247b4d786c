// src/tags/mod.rs

//! Persistent record of which concrete labels have been asserted.
//!
//! - [`file`] stores one marker file per label under `.muddle/tags`.
//! - [`memory`] keeps assertions in memory only.

pub mod file;
pub mod memory;

use crate::errors::{MuddleError, Result};
use crate::label::Label;

pub use file::FileTagStore;
pub use memory::MemoryTagStore;

/// Abstract storage for label assertions.
///
/// Every operation is idempotent and each assert/retract is independently
/// atomic; there are no cross-label transactions. The store does not know
/// about tag ordering.
pub trait TagStore: Send + Sync {
    fn assert(&mut self, label: &Label) -> Result<()>;
    fn is_asserted(&self, label: &Label) -> bool;
    fn retract(&mut self, label: &Label) -> Result<()>;
    /// Retract every asserted label matching `pattern` and return them.
    fn retract_all_matching(&mut self, pattern: &Label) -> Result<Vec<Label>>;
    /// All asserted labels, in label order.
    fn asserted_labels(&self) -> Result<Vec<Label>>;
}

pub(crate) fn ensure_concrete(label: &Label) -> Result<()> {
    if label.is_concrete() {
        Ok(())
    } else {
        Err(MuddleError::malformed(
            &label.to_string(),
            "only concrete labels can be asserted or retracted",
        ))
    }
}
