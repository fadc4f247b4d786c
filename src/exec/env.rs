// src/exec/env.rs

//! Environment and working directory handed to actions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::label::{Kind, Label};
use crate::layout::Layout;

use super::action::Action;
use super::backend::ScheduledAction;

/// Variables describing `label` and the tree, layered over `extra`.
///
/// The `MUDDLE_*` variables always win over same-named entries in `extra`.
/// `MUDDLE_ROLE` is only set for labels with a role.
pub fn environment_for(
    layout: &Layout,
    label: &Label,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut env = extra.clone();

    let kind = label.kind().to_string();
    let name = label.name().to_string();
    let role = label.role_str();

    let src = if label.is_kind(Kind::Checkout.as_str()) {
        layout.checkout_dir(&name)
    } else {
        layout.src_dir()
    };
    let obj = if label.is_kind(Kind::Package.as_str()) {
        layout.obj_dir(&name, role)
    } else {
        layout.obj_root()
    };
    let deploy = if label.is_kind(Kind::Deployment.as_str()) {
        layout.deploy_dir(&name)
    } else {
        layout.deploy_root()
    };

    let mut set = |key: &str, value: String| {
        env.insert(key.to_string(), value);
    };
    set("MUDDLE_ROOT", layout.root().display().to_string());
    set("MUDDLE_LABEL", label.to_string());
    set("MUDDLE_KIND", kind);
    set("MUDDLE_NAME", name);
    if let Some(role) = role {
        set("MUDDLE_ROLE", role.to_string());
    }
    set("MUDDLE_TAG", label.tag().to_string());
    set("MUDDLE_SRC", src.display().to_string());
    set("MUDDLE_OBJ", obj.display().to_string());
    set(
        "MUDDLE_INSTALL",
        layout.install_dir(role).display().to_string(),
    );
    set("MUDDLE_DEPLOY", deploy.display().to_string());

    env
}

/// Directory an action for `label` runs in.
pub fn work_dir_for(layout: &Layout, label: &Label) -> PathBuf {
    let name = label.name().to_string();
    if label.is_kind(Kind::Package.as_str()) {
        layout.obj_dir(&name, label.role_str())
    } else if label.is_kind(Kind::Deployment.as_str()) {
        layout.deploy_dir(&name)
    } else {
        layout.root().to_path_buf()
    }
}

/// The layout plus the user-declared variables: description-wide `[env]`
/// and per-package `env` tables.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentLayer {
    layout: Layout,
    global: BTreeMap<String, String>,
    packages: BTreeMap<String, BTreeMap<String, String>>,
}

impl EnvironmentLayer {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            global: BTreeMap::new(),
            packages: BTreeMap::new(),
        }
    }

    pub fn with_global(mut self, vars: BTreeMap<String, String>) -> Self {
        self.global = vars;
        self
    }

    pub fn set_package_env(&mut self, package: impl Into<String>, vars: BTreeMap<String, String>) {
        self.packages.insert(package.into(), vars);
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn environment_for(&self, label: &Label) -> BTreeMap<String, String> {
        let mut extra = self.global.clone();
        if label.is_kind(Kind::Package.as_str()) {
            if let Some(vars) = label
                .name()
                .as_literal()
                .and_then(|name| self.packages.get(name))
            {
                extra.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        environment_for(&self.layout, label, &extra)
    }

    pub fn schedule(&self, label: &Label, actions: Vec<Action>) -> ScheduledAction {
        ScheduledAction {
            label: label.clone(),
            actions,
            env: self.environment_for(label),
            work_dir: work_dir_for(&self.layout, label),
        }
    }
}
