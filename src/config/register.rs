// src/config/register.rs

//! Standard rule chains for checkouts, packages and deployments.
//!
//! - checkout `c`: `checked_out` clones; `pulled` and `merged` depend on
//!   `checked_out` and update it.
//! - package `p` in role `r`: `preconfig` depends on each checkout's
//!   `checked_out` and on `package:d{r}/postinstalled` for each dependency
//!   `d`; then `configured <- preconfig`, `built <- configured`,
//!   `installed <- built`, `postinstalled <- installed`.
//! - deployment `d`: `deployed` depends on `package:*{r}/postinstalled` for
//!   each of its roles.
//!
//! `[[rule]]` entries are registered afterwards, so they add to these chains.

use std::path::Path;

use tracing::debug;

use crate::config::model::{BuildDescription, CheckoutConfig, DeploymentConfig, PackageConfig};
use crate::dag::AggregateTable;
use crate::errors::Result;
use crate::exec::{Action, DeployCopyAction, EnvironmentLayer, VcsAction, VcsOperation};
use crate::label::{Kind, Label, Tag};
use crate::layout::Layout;
use crate::rules::{Rule, RuleDatabase};

/// Everything a description contributes to an engine.
#[derive(Debug, Clone)]
pub struct Registered {
    pub layout: Layout,
    pub rules: RuleDatabase,
    pub env: EnvironmentLayer,
    pub aggregates: AggregateTable,
}

/// Turn `description` into rules for a tree rooted at `root`.
pub fn register(description: &BuildDescription, root: &Path) -> Result<Registered> {
    let mut layout = Layout::new(root);
    for (name, co) in &description.checkouts {
        if let Some(dir) = &co.directory {
            layout.set_checkout_dir(name, dir);
        }
    }

    let mut rules = RuleDatabase::new();
    for (name, co) in &description.checkouts {
        register_checkout(&mut rules, &layout, name, co)?;
    }
    for (name, pkg) in &description.packages {
        register_package(&mut rules, name, pkg)?;
    }
    for (name, dep) in &description.deployments {
        register_deployment(&mut rules, &layout, name, dep)?;
    }
    for spec in &description.rules {
        let mut rule = Rule::new(spec.target.clone(), spec.command.clone().map(Action::command));
        for dep in &spec.depends {
            rule.add(dep.clone());
        }
        rules.add_rule(rule);
    }
    debug!(rules = rules.len(), "registered build description");

    let mut env = EnvironmentLayer::new(layout.clone()).with_global(description.env.clone());
    for (name, pkg) in &description.packages {
        if !pkg.env.is_empty() {
            env.set_package_env(name, pkg.env.clone());
        }
    }

    let aggregates = AggregateTable::new(
        description.default_roles.clone(),
        description.default_deployments.clone(),
    );

    Ok(Registered {
        layout,
        rules,
        env,
        aggregates,
    })
}

fn register_checkout(
    rules: &mut RuleDatabase,
    layout: &Layout,
    name: &str,
    co: &CheckoutConfig,
) -> Result<()> {
    let vcs = |operation| {
        Action::Vcs(VcsAction {
            vcs: co.vcs,
            operation,
            repo: co.repo.clone().unwrap_or_default(),
            branch: co.branch.clone(),
            directory: layout.checkout_dir(name),
        })
    };

    let checked_out = Label::new(Kind::Checkout.as_str(), name, None, Tag::CHECKED_OUT)?;
    rules.add_rule(Rule::new(
        checked_out.clone(),
        Some(vcs(VcsOperation::Checkout)),
    ));

    for (tag, op) in [(Tag::PULLED, VcsOperation::Pull), (Tag::MERGED, VcsOperation::Merge)] {
        rules.add_rule(
            Rule::new(checked_out.with_tag(tag)?, Some(vcs(op))).depend_on(checked_out.clone()),
        );
    }
    Ok(())
}

fn register_package(rules: &mut RuleDatabase, name: &str, pkg: &PackageConfig) -> Result<()> {
    let sequence = Kind::Package.tag_sequence();

    for role in &pkg.roles {
        let base = Label::new(Kind::Package.as_str(), name, Some(role), Tag::PRECONFIG)?;

        for (i, tag) in sequence.iter().enumerate() {
            let target = base.with_tag(tag)?;
            let action = pkg.steps.get(*tag).cloned().map(Action::command);
            let mut rule = Rule::new(target, action);

            if i == 0 {
                for co in &pkg.checkouts {
                    rule.add(Label::new(
                        Kind::Checkout.as_str(),
                        co,
                        None,
                        Tag::CHECKED_OUT,
                    )?);
                }
                for dep in &pkg.depends {
                    rule.add(Label::new(
                        Kind::Package.as_str(),
                        dep,
                        Some(role),
                        Tag::POSTINSTALLED,
                    )?);
                }
            } else {
                rule.add(base.with_tag(sequence[i - 1])?);
            }
            rules.add_rule(rule);
        }
    }
    Ok(())
}

fn register_deployment(
    rules: &mut RuleDatabase,
    layout: &Layout,
    name: &str,
    dep: &DeploymentConfig,
) -> Result<()> {
    let action = match &dep.command {
        Some(cmd) => Action::command(cmd.clone()),
        None => Action::DeployCopy(DeployCopyAction {
            sources: dep
                .roles
                .iter()
                .map(|r| layout.install_dir(Some(r)))
                .collect(),
            destination: layout.deploy_dir(name),
        }),
    };

    let mut rule = Rule::new(
        Label::new(Kind::Deployment.as_str(), name, None, Tag::DEPLOYED)?,
        Some(action),
    );
    for role in &dep.roles {
        rule.add(Label::new(
            Kind::Package.as_str(),
            "*",
            Some(role),
            Tag::POSTINSTALLED,
        )?);
    }
    rules.add_rule(rule);
    Ok(())
}
