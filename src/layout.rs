// src/layout.rs

//! Directory layout of a build tree.
//!
//! ```text
//! <root>/
//!   muddle.toml
//!   src/<checkout dir>/
//!   obj/<package>/<role>/
//!   install/<role>/
//!   deploy/<deployment>/
//!   .muddle/tags/
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

pub const DESCRIPTION_FILE: &str = "muddle.toml";

const SRC: &str = "src";
const OBJ: &str = "obj";
const INSTALL: &str = "install";
const DEPLOY: &str = "deploy";
const MUDDLE_DIR: &str = ".muddle";
const TAGS: &str = "tags";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    /// Checkout name -> directory relative to `src/`, when it differs from
    /// the checkout name.
    checkout_dirs: BTreeMap<String, PathBuf>,
}

/// Where a path sits inside the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Inside the source directory of a declared checkout.
    Checkout(String),
    /// Inside `obj/<package>` or `obj/<package>/<role>`.
    Object {
        package: String,
        role: Option<String>,
    },
    /// Inside `install/<role>`.
    Install(String),
    /// Inside `deploy/<deployment>`.
    Deploy(String),
    /// Somewhere else in the tree, including the root itself.
    Tree,
    Outside,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            checkout_dirs: BTreeMap::new(),
        }
    }

    /// Record that checkout `name` lives in `src/<dir>`.
    pub fn set_checkout_dir(&mut self, name: impl Into<String>, dir: impl Into<PathBuf>) {
        self.checkout_dirs.insert(name.into(), dir.into());
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn description_file(&self) -> PathBuf {
        self.root.join(DESCRIPTION_FILE)
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join(SRC)
    }

    pub fn obj_root(&self) -> PathBuf {
        self.root.join(OBJ)
    }

    pub fn install_root(&self) -> PathBuf {
        self.root.join(INSTALL)
    }

    pub fn deploy_root(&self) -> PathBuf {
        self.root.join(DEPLOY)
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.root.join(MUDDLE_DIR).join(TAGS)
    }

    pub fn checkout_dir(&self, checkout: &str) -> PathBuf {
        let rel = self
            .checkout_dirs
            .get(checkout)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(checkout));
        self.src_dir().join(rel)
    }

    pub fn obj_dir(&self, package: &str, role: Option<&str>) -> PathBuf {
        let dir = self.obj_root().join(package);
        match role {
            Some(role) => dir.join(role),
            None => dir,
        }
    }

    pub fn install_dir(&self, role: Option<&str>) -> PathBuf {
        match role {
            Some(role) => self.install_root().join(role),
            None => self.install_root(),
        }
    }

    pub fn deploy_dir(&self, deployment: &str) -> PathBuf {
        self.deploy_root().join(deployment)
    }

    /// Classify `path` (absolute, or relative to the current directory).
    ///
    /// `checkouts` are the declared checkout names; when several checkout
    /// directories contain `path`, the longest one wins.
    pub fn locate<'a, I>(&self, path: &Path, checkouts: I) -> Location
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return Location::Outside;
        };
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let mut best: Option<(usize, &str)> = None;
        for name in checkouts {
            let dir = self.checkout_dir(name);
            let Ok(dir_rel) = dir.strip_prefix(&self.root) else {
                continue;
            };
            if rel.starts_with(dir_rel) {
                let depth = dir_rel.components().count();
                if best.is_none_or(|(d, _)| depth > d) {
                    best = Some((depth, name));
                }
            }
        }
        if let Some((_, name)) = best {
            return Location::Checkout(name.to_string());
        }

        match parts.as_slice() {
            [obj, package, role, ..] if obj == OBJ => Location::Object {
                package: package.clone(),
                role: Some(role.clone()),
            },
            [obj, package] if obj == OBJ => Location::Object {
                package: package.clone(),
                role: None,
            },
            [install, role, ..] if install == INSTALL => Location::Install(role.clone()),
            [deploy, name, ..] if deploy == DEPLOY => Location::Deploy(name.clone()),
            _ => Location::Tree,
        }
    }
}

/// Walk up from `start` to the first directory containing `muddle.toml`.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(DESCRIPTION_FILE).is_file())
        .map(Path::to_path_buf)
}
