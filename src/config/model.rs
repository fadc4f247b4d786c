// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::Target;
use crate::exec::VcsKind;
use crate::label::Label;

/// Build description as read from `muddle.toml`, before validation.
///
/// ```toml
/// [description]
/// default_roles = ["x86"]
/// default_deployments = ["rootfs"]
///
/// [checkout.app]
/// repo = "https://example.com/app.git"
///
/// [package.app]
/// roles = ["x86"]
/// checkouts = ["app"]
/// [package.app.steps]
/// built = "make"
///
/// [deployment.rootfs]
/// roles = ["x86"]
/// ```
///
/// All sections are optional; validation insists on at least one entity or
/// rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBuildDescription {
    #[serde(default)]
    pub description: DescriptionSection,

    /// Variables exported to every action.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub checkout: BTreeMap<String, CheckoutConfig>,

    #[serde(default)]
    pub package: BTreeMap<String, PackageConfig>,

    #[serde(default)]
    pub deployment: BTreeMap<String, DeploymentConfig>,

    /// Free-form `[[rule]]` entries.
    #[serde(default)]
    pub rule: Vec<RuleConfig>,
}

/// `[description]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptionSection {
    /// Roles built by `_default_roles` and by DWIM inside a checkout.
    #[serde(default)]
    pub default_roles: Vec<String>,

    #[serde(default)]
    pub default_deployments: Vec<String>,

    /// What a bare `muddle` builds at the top of the tree. Labels or
    /// aggregate names.
    #[serde(default)]
    pub default_targets: Vec<String>,
}

/// `[checkout.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub vcs: VcsKind,

    /// Repository URL; required unless `vcs = "none"`.
    #[serde(default)]
    pub repo: Option<String>,

    #[serde(default)]
    pub branch: Option<String>,

    /// Directory under `src/`; defaults to the checkout name.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// `[package.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    pub roles: Vec<String>,

    /// Checkouts whose sources this package builds from.
    #[serde(default)]
    pub checkouts: Vec<String>,

    /// Other packages this one needs installed first, in the same role.
    #[serde(default)]
    pub depends: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Shell command per package tag (`configured`, `built`, ...).
    #[serde(default)]
    pub steps: BTreeMap<String, String>,
}

/// `[deployment.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Roles whose packages this deployment collects.
    #[serde(default)]
    pub roles: Vec<String>,

    /// If unset, the install trees of `roles` are copied into
    /// `deploy/<name>`.
    #[serde(default)]
    pub command: Option<String>,
}

/// One `[[rule]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub target: String,

    #[serde(default)]
    pub depends: Vec<String>,

    #[serde(default)]
    pub command: Option<String>,
}

/// A `[[rule]]` with its labels parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub target: Label,
    pub depends: Vec<Label>,
    pub command: Option<String>,
}

/// Validated build description.
///
/// Only constructed through `TryFrom<RawBuildDescription>`, so every name it
/// mentions is declared and every label parses.
#[derive(Debug, Clone)]
pub struct BuildDescription {
    pub default_roles: Vec<String>,
    pub default_deployments: Vec<String>,
    pub default_targets: Vec<Target>,
    pub env: BTreeMap<String, String>,
    pub checkouts: BTreeMap<String, CheckoutConfig>,
    pub packages: BTreeMap<String, PackageConfig>,
    pub deployments: BTreeMap<String, DeploymentConfig>,
    pub rules: Vec<RuleSpec>,
}

impl BuildDescription {
    pub(crate) fn new_unchecked(
        raw: RawBuildDescription,
        default_targets: Vec<Target>,
        rules: Vec<RuleSpec>,
    ) -> Self {
        Self {
            default_roles: raw.description.default_roles,
            default_deployments: raw.description.default_deployments,
            default_targets,
            env: raw.env,
            checkouts: raw.checkout,
            packages: raw.package,
            deployments: raw.deployment,
            rules,
        }
    }

    /// Every role some package is built in, sorted.
    pub fn all_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .packages
            .values()
            .flat_map(|p| p.roles.iter().cloned())
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }

    /// Roles DWIM builds by default: the declared defaults, or every role.
    pub fn effective_default_roles(&self) -> Vec<String> {
        if self.default_roles.is_empty() {
            self.all_roles()
        } else {
            self.default_roles.clone()
        }
    }
}
