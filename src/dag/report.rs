// src/dag/report.rs

use crate::label::Label;

/// What a successful scheduler run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Labels asserted during the run, in the order they were asserted.
    pub asserted: Vec<Label>,
    /// Labels handed to the invoker, in order.
    pub invoked: Vec<Label>,
    /// Labels that were already up to date (leaves included).
    pub satisfied: Vec<Label>,
}

impl BuildReport {
    /// Nothing had to run.
    pub fn is_up_to_date(&self) -> bool {
        self.invoked.is_empty()
    }
}
