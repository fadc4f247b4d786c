// src/config/validate.rs

use std::collections::BTreeSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{BuildDescription, RawBuildDescription, RuleSpec};
use crate::dag::Target;
use crate::errors::{MuddleError, Result};
use crate::exec::VcsKind;
use crate::label::{Kind, Label};

impl TryFrom<RawBuildDescription> for BuildDescription {
    type Error = MuddleError;

    fn try_from(raw: RawBuildDescription) -> std::result::Result<Self, Self::Error> {
        validate_raw_description(&raw)?;
        let default_targets = parse_default_targets(&raw)?;
        let rules = parse_rules(&raw)?;
        Ok(BuildDescription::new_unchecked(raw, default_targets, rules))
    }
}

fn validate_raw_description(raw: &RawBuildDescription) -> Result<()> {
    ensure_not_empty(raw)?;
    validate_names(raw)?;
    validate_checkouts(raw)?;
    validate_packages(raw)?;
    validate_deployments(raw)?;
    validate_defaults(raw)?;
    validate_package_dag(raw)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> MuddleError {
    MuddleError::ConfigError(msg.into())
}

/// Say where in the description a bad label was found.
fn malformed_in(err: MuddleError, place: &str) -> MuddleError {
    match err {
        MuddleError::MalformedLabel { text, reason } => MuddleError::MalformedLabel {
            text,
            reason: format!("{place}: {reason}"),
        },
        other => other,
    }
}

fn ensure_not_empty(raw: &RawBuildDescription) -> Result<()> {
    if raw.checkout.is_empty()
        && raw.package.is_empty()
        && raw.deployment.is_empty()
        && raw.rule.is_empty()
    {
        return Err(config_error(
            "build description must declare at least one checkout, package, deployment or [[rule]]",
        ));
    }
    Ok(())
}

/// Entity names and roles end up inside labels, so they must be valid,
/// non-reserved label components.
fn validate_names(raw: &RawBuildDescription) -> Result<()> {
    let check = |kind: Kind, name: &str, role: Option<&str>| -> Result<()> {
        if name == "*" || role == Some("*") {
            return Err(config_error(format!(
                "{kind} '{name}': '*' is not a valid name or role"
            )));
        }
        Label::new(kind.as_str(), name, role, kind.final_tag())
            .map(|_| ())
            .map_err(|e| config_error(format!("{kind} '{name}': {e}")))
    };

    for name in raw.checkout.keys() {
        check(Kind::Checkout, name, None)?;
    }
    for (name, pkg) in &raw.package {
        check(Kind::Package, name, None)?;
        for role in &pkg.roles {
            check(Kind::Package, name, Some(role))?;
        }
    }
    for name in raw.deployment.keys() {
        check(Kind::Deployment, name, None)?;
    }
    Ok(())
}

fn validate_checkouts(raw: &RawBuildDescription) -> Result<()> {
    for (name, co) in &raw.checkout {
        if co.vcs == VcsKind::Git && co.repo.as_deref().is_none_or(str::is_empty) {
            return Err(config_error(format!(
                "checkout '{name}' uses git but has no `repo`"
            )));
        }
        if let Some(dir) = &co.directory {
            if dir.is_absolute() || dir.components().any(|c| c.as_os_str() == "..") {
                return Err(config_error(format!(
                    "checkout '{name}': `directory` must be a relative path inside src/ (got {})",
                    dir.display()
                )));
            }
        }
    }
    Ok(())
}

fn validate_packages(raw: &RawBuildDescription) -> Result<()> {
    let tags = Kind::Package.tag_sequence();

    for (name, pkg) in &raw.package {
        if pkg.roles.is_empty() {
            return Err(config_error(format!(
                "package '{name}' must list at least one role in `roles`"
            )));
        }
        for co in &pkg.checkouts {
            if !raw.checkout.contains_key(co) {
                return Err(config_error(format!(
                    "package '{name}' uses unknown checkout '{co}'"
                )));
            }
        }
        for dep in &pkg.depends {
            if dep == name {
                return Err(config_error(format!(
                    "package '{name}' cannot depend on itself"
                )));
            }
            let Some(dep_pkg) = raw.package.get(dep) else {
                return Err(config_error(format!(
                    "package '{name}' depends on unknown package '{dep}'"
                )));
            };
            for role in &pkg.roles {
                if !dep_pkg.roles.contains(role) {
                    return Err(config_error(format!(
                        "package '{name}' depends on '{dep}' in role '{role}', \
                         but '{dep}' is not built in that role"
                    )));
                }
            }
        }
        for step in pkg.steps.keys() {
            if !tags.contains(&step.as_str()) {
                return Err(config_error(format!(
                    "package '{name}' has step '{step}', expected one of: {}",
                    tags.join(", ")
                )));
            }
        }
    }
    Ok(())
}

fn declared_roles(raw: &RawBuildDescription) -> BTreeSet<&str> {
    raw.package
        .values()
        .flat_map(|p| p.roles.iter().map(String::as_str))
        .collect()
}

fn validate_deployments(raw: &RawBuildDescription) -> Result<()> {
    let roles = declared_roles(raw);
    for (name, dep) in &raw.deployment {
        for role in &dep.roles {
            if !roles.contains(role.as_str()) {
                return Err(config_error(format!(
                    "deployment '{name}' collects role '{role}', which no package is built in"
                )));
            }
        }
    }
    Ok(())
}

fn validate_defaults(raw: &RawBuildDescription) -> Result<()> {
    let roles = declared_roles(raw);
    for role in &raw.description.default_roles {
        if !roles.contains(role.as_str()) {
            return Err(config_error(format!(
                "[description].default_roles names role '{role}', which no package is built in"
            )));
        }
    }
    for dep in &raw.description.default_deployments {
        if !raw.deployment.contains_key(dep) {
            return Err(config_error(format!(
                "[description].default_deployments names unknown deployment '{dep}'"
            )));
        }
    }
    Ok(())
}

/// Package `depends` must form a DAG.
fn validate_package_dag(raw: &RawBuildDescription) -> Result<()> {
    // Edge direction: dependency -> package.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in raw.package.keys() {
        graph.add_node(name.as_str());
    }
    for (name, pkg) in &raw.package {
        for dep in &pkg.depends {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(MuddleError::CyclicDependency(format!(
            "package dependencies form a cycle involving package '{}'",
            cycle.node_id()
        ))),
    }
}

fn parse_default_targets(raw: &RawBuildDescription) -> Result<Vec<Target>> {
    raw.description
        .default_targets
        .iter()
        .map(|t| {
            t.parse::<Target>()
                .map_err(|e| malformed_in(e, "[description].default_targets"))
        })
        .collect()
}

fn parse_rules(raw: &RawBuildDescription) -> Result<Vec<RuleSpec>> {
    raw.rule
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let place = format!("[[rule]] #{}", i + 1);
            let parse = |text: &str| Label::parse(text).map_err(|e| malformed_in(e, &place));
            Ok(RuleSpec {
                target: parse(&r.target)?,
                depends: r.depends.iter().map(|d| parse(d)).collect::<Result<_>>()?,
                command: r.command.clone(),
            })
        })
        .collect()
}
