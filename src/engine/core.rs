// src/engine/core.rs

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{debug, info};

use crate::config::register::{register, Registered};
use crate::config::{load_and_validate, BuildDescription};
use crate::dag::{build_graph, concrete_targets, BuildReport, DependencyGraph, Scheduler, Target};
use crate::dwim::{self, DwimRequest};
use crate::errors::{MuddleError, Result};
use crate::exec::{ActionInvoker, DryRunInvoker};
use crate::label::{Kind, Label, Tag};
use crate::layout::Layout;
use crate::tags::{FileTagStore, MemoryTagStore, TagStore};

/// One build tree: its description, rules and assertion state.
///
/// There is no global builder; callers own an `Engine` and pass it around.
pub struct Engine {
    pub(crate) description: BuildDescription,
    pub(crate) registered: Registered,
    pub(crate) store: Box<dyn TagStore>,
    interrupt: Arc<AtomicBool>,
}

impl Engine {
    /// Load `<root>/muddle.toml` and open the tag store under `.muddle/`.
    pub fn load(root: &Path) -> Result<Self> {
        let layout = Layout::new(root);
        let description = load_and_validate(layout.description_file())?;
        let store = FileTagStore::new(layout.tags_dir());
        Self::from_description(description, root, Box::new(store))
    }

    /// Build an engine from an already loaded description and any store.
    pub fn from_description(
        description: BuildDescription,
        root: &Path,
        store: Box<dyn TagStore>,
    ) -> Result<Self> {
        let registered = register(&description, root)?;
        info!(
            root = %root.display(),
            rules = registered.rules.len(),
            "engine ready"
        );
        Ok(Self {
            description,
            registered,
            store,
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn description(&self) -> &BuildDescription {
        &self.description
    }

    pub fn layout(&self) -> &Layout {
        &self.registered.layout
    }

    pub fn store(&self) -> &dyn TagStore {
        self.store.as_ref()
    }

    /// Flag that stops a running build before its next action once set.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Expand targets into their concrete labels.
    pub fn concrete_targets(&self, targets: &[Target]) -> Result<BTreeSet<Label>> {
        concrete_targets(targets, &self.registered.rules, &self.registered.aggregates)
    }

    /// The dependency graph for `targets`, without running anything.
    pub fn plan(&self, targets: &[Target]) -> Result<DependencyGraph> {
        let roots = self.concrete_targets(targets)?;
        build_graph(&roots, &self.registered.rules)
    }

    /// Bring `targets` and everything they need into the asserted state.
    pub async fn build(
        &mut self,
        targets: &[Target],
        invoker: &mut dyn ActionInvoker,
    ) -> Result<BuildReport> {
        let graph = self.plan(targets)?;
        let interrupt = self.interrupt_handle();
        let result = Scheduler::new(&graph, self.store.as_mut(), &self.registered.env)
            .with_interrupt(interrupt)
            .run(invoker)
            .await;

        let asserted = match &result {
            Ok(report) => report.asserted.as_slice(),
            Err(err) => err.asserted_before_failure(),
        };
        self.retract_stale_dependents(asserted)?;
        result
    }

    /// Retract known labels outside this run that depend on something it
    /// just rebuilt, so a later build of them runs their actions again.
    fn retract_stale_dependents(&mut self, rebuilt: &[Label]) -> Result<()> {
        if rebuilt.is_empty() {
            return Ok(());
        }
        let fresh: BTreeSet<&Label> = rebuilt.iter().collect();
        let mut stale = Vec::new();
        for dependent in self.registered.rules.required_by_any(rebuilt) {
            if !fresh.contains(&dependent) && self.store.is_asserted(&dependent) {
                self.store.retract(&dependent)?;
                stale.push(dependent);
            }
        }
        if !stale.is_empty() {
            debug!(count = stale.len(), "retracted dependents of rebuilt labels");
        }
        Ok(())
    }

    /// Retract what `targets` consist of, then build them again.
    pub async fn rebuild(
        &mut self,
        targets: &[Target],
        invoker: &mut dyn ActionInvoker,
    ) -> Result<BuildReport> {
        let roots = self.concrete_targets(targets)?;
        for label in &roots {
            for l in rebuild_set(label)? {
                self.store.retract(&l)?;
            }
        }
        self.build(targets, invoker).await
    }

    /// Retract every asserted label matching any of `patterns`, along with
    /// every asserted label that depends on one of them.
    pub fn retract(&mut self, patterns: &[Label]) -> Result<Vec<Label>> {
        let mut removed = BTreeSet::new();
        for pattern in patterns {
            removed.extend(self.store.retract_all_matching(pattern)?);
        }
        for dependent in self.registered.rules.required_by_any(patterns) {
            if self.store.is_asserted(&dependent) {
                self.store.retract(&dependent)?;
                removed.insert(dependent);
            }
        }
        info!(count = removed.len(), "retracted");
        Ok(removed.into_iter().collect())
    }

    /// What [`Engine::retract`] would remove, without removing it.
    pub fn retraction_set(&self, patterns: &[Label]) -> Result<Vec<Label>> {
        let dependents = self.registered.rules.required_by_any(patterns);
        Ok(self
            .store
            .asserted_labels()?
            .into_iter()
            .filter(|l| patterns.iter().any(|p| l.matches(p)) || dependents.contains(l))
            .collect())
    }

    /// Mark labels as asserted without running anything.
    pub fn assert_labels(&mut self, labels: &[Label]) -> Result<()> {
        for label in labels {
            if !label.is_concrete() {
                return Err(MuddleError::malformed(
                    &label.to_string(),
                    "only concrete labels can be asserted",
                ));
            }
        }
        for label in labels {
            self.store.assert(label)?;
        }
        Ok(())
    }

    /// Choose targets for `cwd`.
    pub fn resolve_dwim(&self, cwd: &Path) -> Result<DwimRequest> {
        dwim::resolve(
            cwd,
            &self.registered.layout,
            &self.description,
            &self.registered.rules,
        )
    }

    /// Run a build or rebuild against a copy of the current state, so nothing
    /// runs and nothing on disk changes. `echo` prints each step.
    pub async fn simulate(
        &self,
        targets: &[Target],
        rebuild: bool,
        echo: bool,
    ) -> Result<BuildReport> {
        let roots = self.concrete_targets(targets)?;
        let mut store = MemoryTagStore::with_asserted(self.store.asserted_labels()?);
        if rebuild {
            for label in &roots {
                for l in rebuild_set(label)? {
                    store.retract(&l)?;
                }
            }
        }

        let graph = build_graph(&roots, &self.registered.rules)?;
        let mut invoker = if echo {
            DryRunInvoker::printing()
        } else {
            DryRunInvoker::silent()
        };
        debug!(roots = roots.len(), rebuild, "simulating build");
        Scheduler::new(&graph, &mut store, &self.registered.env)
            .run(&mut invoker)
            .await
    }
}

/// Labels to retract so that `label` is rebuilt.
///
/// For packages this is every tag from `built` onwards, so configuration
/// is kept; anything else is just retracted itself.
fn rebuild_set(label: &Label) -> Result<Vec<Label>> {
    let mut labels = Vec::new();
    if label.is_kind(Kind::Package.as_str()) {
        for tag in Kind::Package.tags_from(Tag::BUILT) {
            labels.push(label.with_tag(tag)?);
        }
    }
    if !labels.contains(label) {
        labels.push(label.clone());
    }
    Ok(labels)
}
