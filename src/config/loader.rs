// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{BuildDescription, RawBuildDescription};
use crate::errors::{MuddleError, Result};
use crate::layout::{self, DESCRIPTION_FILE};

/// Read `muddle.toml` from `path` without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawBuildDescription> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let raw: RawBuildDescription = toml::from_str(&contents)?;
    Ok(raw)
}

/// Read and validate a build description.
///
/// This is the entry point the rest of the crate uses:
///
/// - Reads TOML.
/// - Checks that every referenced checkout, package, role and deployment
///   is declared.
/// - Parses rule and default target labels.
/// - Rejects cycles among package dependencies.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BuildDescription> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let description = BuildDescription::try_from(raw)?;
    debug!(
        path = %path.display(),
        checkouts = description.checkouts.len(),
        packages = description.packages.len(),
        deployments = description.deployments.len(),
        rules = description.rules.len(),
        "loaded build description"
    );
    Ok(description)
}

/// Parse a description from a string. Used by tests and tools that
/// generate descriptions.
pub fn parse_description(text: &str) -> Result<BuildDescription> {
    let raw: RawBuildDescription = toml::from_str(text)?;
    BuildDescription::try_from(raw)
}

/// Locate the root of the build tree.
///
/// An explicit root wins and must contain `muddle.toml`; otherwise walk up
/// from `cwd`.
pub fn discover_root(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(root) = explicit {
        if root.join(DESCRIPTION_FILE).is_file() {
            return Ok(root.to_path_buf());
        }
        return Err(MuddleError::ConfigError(format!(
            "{} does not contain {DESCRIPTION_FILE}",
            root.display()
        )));
    }

    layout::find_root(cwd).ok_or_else(|| {
        MuddleError::NoDefaultTarget(format!(
            "{} is not inside a build tree (no {DESCRIPTION_FILE} found here or above); \
             run muddle from within a tree or pass --root",
            cwd.display()
        ))
    })
}
