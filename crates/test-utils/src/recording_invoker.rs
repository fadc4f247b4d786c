use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use muddle::errors::Result;
use muddle::exec::{ActionInvoker, ActionOutcome, ScheduledAction};
use muddle::label::Label;

/// An invoker that:
/// - records every scheduled action it is handed, in order
/// - reports `Success`, or `Failed` for labels registered with `fail_on`.
///
/// Clones share the same record, so a test can keep one handle while the
/// engine borrows another.
#[derive(Debug, Clone, Default)]
pub struct RecordingInvoker {
    seen: Arc<Mutex<Vec<ScheduledAction>>>,
    failing: BTreeSet<Label>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the action for `label` fail with exit code 1.
    pub fn fail_on(mut self, label: Label) -> Self {
        self.failing.insert(label);
        self
    }

    /// Labels invoked so far, in order.
    pub fn labels(&self) -> Vec<Label> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.label.clone())
            .collect()
    }

    /// Label strings invoked so far, in order.
    pub fn label_strings(&self) -> Vec<String> {
        self.labels().iter().map(|l| l.to_string()).collect()
    }

    /// Everything handed to the invoker so far.
    pub fn scheduled(&self) -> Vec<ScheduledAction> {
        self.seen.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl ActionInvoker for RecordingInvoker {
    fn invoke(
        &mut self,
        action: ScheduledAction,
    ) -> Pin<Box<dyn Future<Output = Result<ActionOutcome>> + Send + '_>> {
        let failed = self.failing.contains(&action.label);
        let seen = Arc::clone(&self.seen);

        Box::pin(async move {
            {
                let mut guard = seen.lock().unwrap();
                guard.push(action.clone());
            }

            if failed {
                Ok(ActionOutcome::Failed {
                    code: 1,
                    diagnostics: format!("recorded failure for {}", action.label),
                })
            } else {
                Ok(ActionOutcome::Success)
            }
        })
    }
}
