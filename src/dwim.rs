// src/dwim.rs

//! "Do what I mean": choose targets from the current directory.
//!
//! Checked in priority order:
//!
//! 1. Inside a checkout's source directory: every package (in the default
//!    roles, or all roles if none are declared) that depends on that
//!    checkout, rebuilt.
//! 2. Inside `obj/<package>/<role>`: that package, rebuilt. Inside
//!    `obj/<package>`: every role of it.
//! 3. Inside `install/<role>`: every package in that role.
//! 4. Inside `deploy/<name>`: that deployment.
//! 5. Anywhere else in the tree: the declared default targets.

use std::path::Path;

use tracing::debug;

use crate::config::BuildDescription;
use crate::dag::Target;
use crate::errors::{MuddleError, Result};
use crate::label::{Kind, Label, Tag};
use crate::layout::{Layout, Location};
use crate::rules::RuleDatabase;

/// Targets picked for a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwimRequest {
    pub location: Location,
    pub targets: Vec<Target>,
    /// Retract before building so the targets run again.
    pub rebuild: bool,
}

pub fn resolve(
    cwd: &Path,
    layout: &Layout,
    description: &BuildDescription,
    rules: &RuleDatabase,
) -> Result<DwimRequest> {
    let location = layout.locate(cwd, description.checkouts.keys().map(String::as_str));
    debug!(cwd = %cwd.display(), ?location, "resolving targets from directory");

    let (labels, rebuild) = match &location {
        Location::Checkout(name) => (packages_using_checkout(name, description, rules)?, true),
        Location::Object {
            package,
            role: Some(role),
        } => (vec![postinstalled(package, role)?], true),
        Location::Object {
            package,
            role: None,
        } => (expand_nonempty(rules, &postinstalled(package, "*")?, &location)?, true),
        Location::Install(role) => (
            expand_nonempty(rules, &postinstalled("*", role)?, &location)?,
            false,
        ),
        Location::Deploy(name) => (
            vec![Label::new(Kind::Deployment.as_str(), name, None, Tag::DEPLOYED)?],
            false,
        ),
        Location::Tree => {
            if description.default_targets.is_empty() {
                return Err(MuddleError::NoDefaultTarget(
                    "no default targets are declared; add `default_targets` to [description] \
                     in muddle.toml, name a target (e.g. `muddle build _all`), or run muddle \
                     from a checkout, obj, install or deploy directory"
                        .to_string(),
                ));
            }
            return Ok(DwimRequest {
                location,
                targets: description.default_targets.clone(),
                rebuild: false,
            });
        }
        Location::Outside => {
            return Err(MuddleError::NoDefaultTarget(format!(
                "{} is outside the build tree at {}",
                cwd.display(),
                layout.root().display()
            )));
        }
    };

    Ok(DwimRequest {
        location,
        targets: labels.into_iter().map(Target::Label).collect(),
        rebuild,
    })
}

fn postinstalled(package: &str, role: &str) -> Result<Label> {
    Label::new(Kind::Package.as_str(), package, Some(role), Tag::POSTINSTALLED)
}

fn expand_nonempty(rules: &RuleDatabase, pattern: &Label, location: &Location) -> Result<Vec<Label>> {
    let labels: Vec<Label> = rules.expand(pattern).into_iter().collect();
    if labels.is_empty() {
        return Err(MuddleError::NoDefaultTarget(format!(
            "nothing is built here ({location:?}): {pattern} matches no known label"
        )));
    }
    Ok(labels)
}

fn packages_using_checkout(
    checkout: &str,
    description: &BuildDescription,
    rules: &RuleDatabase,
) -> Result<Vec<Label>> {
    let checked_out = Label::new(Kind::Checkout.as_str(), checkout, None, Tag::CHECKED_OUT)?;
    let dependents = rules.required_by(&checked_out);
    let roles = description.effective_default_roles();

    let mut labels = Vec::new();
    for role in &roles {
        let pattern = postinstalled("*", role)?;
        labels.extend(
            rules
                .expand(&pattern)
                .into_iter()
                .filter(|l| dependents.contains(l)),
        );
    }

    if labels.is_empty() {
        return Err(MuddleError::NoDefaultTarget(format!(
            "no package in role(s) [{}] is built from checkout '{checkout}'",
            roles.join(", ")
        )));
    }
    Ok(labels)
}
