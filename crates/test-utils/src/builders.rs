#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use muddle::config::parse_description;
use muddle::engine::Engine;
use muddle::exec::Action;
use muddle::layout::DESCRIPTION_FILE;
use muddle::rules::{Rule, RuleDatabase};
use muddle::tags::MemoryTagStore;

use crate::label;

/// Builder for `RuleDatabase` to simplify test setup.
#[derive(Default)]
pub struct RuleDatabaseBuilder {
    db: RuleDatabase,
}

impl RuleDatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule for `target` running `cmd`, depending on `deps`.
    pub fn rule(mut self, target: &str, cmd: &str, deps: &[&str]) -> Self {
        let mut rule = Rule::new(label(target), Some(Action::command(cmd)));
        for dep in deps {
            rule.add(label(dep));
        }
        self.db.add_rule(rule);
        self
    }

    /// A rule with no action, only dependencies.
    pub fn depends(mut self, target: &str, deps: &[&str]) -> Self {
        let mut rule = Rule::new(label(target), None);
        for dep in deps {
            rule.add(label(dep));
        }
        self.db.add_rule(rule);
        self
    }

    pub fn build(self) -> RuleDatabase {
        self.db
    }
}

/// A build tree in a temporary directory, holding a `muddle.toml`.
///
/// The directory is removed when the value is dropped.
pub struct TempTree {
    dir: TempDir,
    root: PathBuf,
}

impl TempTree {
    pub fn new(description: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        // Canonical so that paths compare equal to `current_dir()` results.
        let root = dir.path().canonicalize().expect("canonicalize temp dir");
        fs::write(root.join(DESCRIPTION_FILE), description).expect("write muddle.toml");
        Self { dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `rel` (and parents) under the root and return its path.
    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(&path).expect("create dir in tree");
        path
    }

    /// An engine over this tree with its tag store under `.muddle/`.
    pub fn engine(&self) -> Engine {
        Engine::load(&self.root).expect("load engine")
    }

    /// An engine over this tree whose tags live only in memory.
    pub fn memory_engine(&self) -> Engine {
        let text = fs::read_to_string(self.root.join(DESCRIPTION_FILE)).expect("read muddle.toml");
        let description = parse_description(&text).expect("valid description");
        Engine::from_description(description, &self.root, Box::new(MemoryTagStore::new()))
            .expect("register description")
    }
}

/// A small tree: two checkouts, three packages in role `x86`, one
/// deployment. `c` depends on `b`, `b` on `a`.
pub const THREE_PACKAGES: &str = r#"
[description]
default_roles = ["x86"]
default_deployments = ["rootfs"]
default_targets = ["_default_deployments"]

[checkout.core]
vcs = "none"

[checkout.tools]
vcs = "none"
directory = "vendor/tools"

[package.a]
roles = ["x86"]
checkouts = ["core"]
[package.a.steps]
built = "make a"

[package.b]
roles = ["x86"]
checkouts = ["core"]
depends = ["a"]
[package.b.steps]
built = "make b"

[package.c]
roles = ["x86"]
checkouts = ["tools"]
depends = ["b"]
[package.c.steps]
built = "make c"

[deployment.rootfs]
roles = ["x86"]
command = "mkimage"
"#;
