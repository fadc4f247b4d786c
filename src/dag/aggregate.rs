// src/dag/aggregate.rs

//! Named aggregate targets such as `_all` or `_default_deployments`.

use std::collections::BTreeSet;
use std::fmt;

use crate::errors::{MuddleError, Result};
use crate::label::{Kind, Label, Tag};
use crate::rules::RuleDatabase;

/// Aggregate names understood by [`AggregateTable::resolve`].
pub const AGGREGATE_NAMES: &[&str] = &[
    "_all",
    "_all_checkouts",
    "_all_packages",
    "_all_deployments",
    "_default_roles",
    "_default_deployments",
];

/// Policy for turning aggregate names into concrete labels.
///
/// Built by the description loader from the declared default roles and
/// deployments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateTable {
    pub default_roles: Vec<String>,
    pub default_deployments: Vec<String>,
}

/// A parsed aggregate name: the base name plus an optional `{role}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub name: String,
    pub role: Option<String>,
}

impl Aggregate {
    /// Parse `_all`, `_all{x86}`, `_all_packages{arm}` and friends.
    pub fn parse(text: &str) -> Option<Self> {
        let (name, role) = match text.split_once('{') {
            Some((name, rest)) => (name, Some(rest.strip_suffix('}')?.to_string())),
            None => (text, None),
        };
        if !AGGREGATE_NAMES.contains(&name) {
            return None;
        }
        if role.as_deref().is_some_and(str::is_empty) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            role,
        })
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Some(role) => write!(f, "{}{{{}}}", self.name, role),
            None => f.write_str(&self.name),
        }
    }
}

impl AggregateTable {
    pub fn new(default_roles: Vec<String>, default_deployments: Vec<String>) -> Self {
        Self {
            default_roles,
            default_deployments,
        }
    }

    /// Expand an aggregate into the known concrete labels it stands for.
    ///
    /// Fails with `NoRules` when the aggregate denotes nothing.
    pub fn resolve(&self, aggregate: &Aggregate, db: &RuleDatabase) -> Result<BTreeSet<Label>> {
        let role = aggregate.role.as_deref();
        let labels = match aggregate.name.as_str() {
            "_all_checkouts" => known(db, Kind::Checkout, "*", role, Tag::CHECKED_OUT)?,
            "_all_packages" => known(db, Kind::Package, "*", role, Tag::POSTINSTALLED)?,
            "_all_deployments" => known(db, Kind::Deployment, "*", role, Tag::DEPLOYED)?,
            "_all" => {
                let mut all = known(db, Kind::Checkout, "*", role, Tag::CHECKED_OUT)?;
                all.extend(known(db, Kind::Package, "*", role, Tag::POSTINSTALLED)?);
                all.extend(known(db, Kind::Deployment, "*", role, Tag::DEPLOYED)?);
                all
            }
            "_default_roles" => {
                let mut labels = BTreeSet::new();
                for r in &self.default_roles {
                    labels.extend(known(db, Kind::Package, "*", Some(r), Tag::POSTINSTALLED)?);
                }
                labels
            }
            "_default_deployments" => {
                let mut labels = BTreeSet::new();
                for d in &self.default_deployments {
                    labels.extend(known(db, Kind::Deployment, d, Some("*"), Tag::DEPLOYED)?);
                }
                labels
            }
            other => {
                return Err(MuddleError::NoRules(format!(
                    "unknown aggregate target '{other}'"
                )));
            }
        };

        if labels.is_empty() {
            return Err(MuddleError::NoRules(format!(
                "aggregate target '{aggregate}' does not match any known label"
            )));
        }
        Ok(labels)
    }
}

fn known(
    db: &RuleDatabase,
    kind: Kind,
    name: &str,
    role: Option<&str>,
    tag: &str,
) -> Result<BTreeSet<Label>> {
    let pattern = Label::new(kind.as_str(), name, Some(role.unwrap_or("*")), tag)?;
    Ok(db.expand(&pattern))
}
