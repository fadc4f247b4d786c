// src/tags/file.rs

//! Marker-file tag store.
//!
//! Each asserted label is one file:
//!
//! - `<root>/<kind>/<name>/<tag>` for labels without a role
//! - `<root>/<kind>/<name>/{<role>}/<tag>` for labels with a role
//!
//! where `<root>` is normally `<tree>/.muddle/tags`. Markers are written to a
//! temporary file next to their final location and renamed into place, so
//! an interrupted write never leaves a half-written marker. External tools
//! may assert or retract labels by creating or deleting these files.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{ensure_concrete, TagStore};
use crate::errors::Result;
use crate::label::Label;

/// Stores assertions as marker files, with transient labels kept in memory.
#[derive(Debug)]
pub struct FileTagStore {
    root: PathBuf,
    transient: BTreeSet<Label>,
}

impl FileTagStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            transient: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the marker for a concrete label.
    pub fn marker_path(&self, label: &Label) -> PathBuf {
        let mut path = self.root.join(label.kind().to_string()).join(label.name().to_string());
        if let Some(role) = label.role() {
            path.push(format!("{{{role}}}"));
        }
        path.push(label.tag().to_string());
        path
    }

    /// Reconstruct the label a marker path stands for.
    ///
    /// Returns `None` for anything that is not a marker (temporary files,
    /// stray files at the wrong depth).
    pub fn label_for_marker(&self, path: &Path) -> Option<Label> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;

        let text = match parts.as_slice() {
            [kind, name, tag] => format!("{kind}:{name}/{tag}"),
            [kind, name, role, tag] => {
                let role = role.strip_prefix('{')?.strip_suffix('}')?;
                format!("{kind}:{name}{{{role}}}/{tag}")
            }
            _ => return None,
        };

        match Label::parse_system(&text) {
            Ok(label) if label.is_concrete() => Some(label),
            _ => None,
        }
    }

    fn marker_paths(&self) -> Vec<PathBuf> {
        if !self.root.exists() {
            return Vec::new();
        }
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable tag store entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }
}

fn timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs}\n")
}

impl TagStore for FileTagStore {
    fn assert(&mut self, label: &Label) -> Result<()> {
        ensure_concrete(label)?;

        if label.is_transient() {
            if self.transient.insert(label.clone()) {
                debug!(label = %label, "asserted (transient)");
            }
            return Ok(());
        }

        let path = self.marker_path(label);
        if path.is_file() {
            return Ok(());
        }

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(timestamp().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(label = %label, path = %path.display(), "asserted");
        Ok(())
    }

    fn is_asserted(&self, label: &Label) -> bool {
        if label.is_transient() {
            return self.transient.contains(label);
        }
        self.transient.contains(label) || self.marker_path(label).is_file()
    }

    fn retract(&mut self, label: &Label) -> Result<()> {
        ensure_concrete(label)?;
        self.transient.remove(label);

        let path = self.marker_path(label);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(label = %label, "retracted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn retract_all_matching(&mut self, pattern: &Label) -> Result<Vec<Label>> {
        let mut removed: BTreeSet<Label> = BTreeSet::new();

        let transient: Vec<Label> = self
            .transient
            .iter()
            .filter(|l| l.matches(pattern))
            .cloned()
            .collect();
        for label in transient {
            self.transient.remove(&label);
            removed.insert(label);
        }

        for path in self.marker_paths() {
            let Some(label) = self.label_for_marker(&path) else {
                continue;
            };
            if !label.matches(pattern) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            removed.insert(label);
        }

        if !removed.is_empty() {
            info!(pattern = %pattern, count = removed.len(), "retracted matching labels");
        }
        Ok(removed.into_iter().collect())
    }

    fn asserted_labels(&self) -> Result<Vec<Label>> {
        let mut labels: BTreeSet<Label> = self.transient.iter().cloned().collect();
        labels.extend(
            self.marker_paths()
                .iter()
                .filter_map(|p| self.label_for_marker(p)),
        );
        Ok(labels.into_iter().collect())
    }
}
