// src/exec/deploy.rs

//! Default deployment action: merge install trees into a deploy directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Copy every file under each of `sources` into `destination`, preserving
/// relative paths. Later sources overwrite earlier ones. Missing sources are
/// skipped. Returns the number of files copied.
pub fn copy_trees(sources: &[PathBuf], destination: &Path) -> io::Result<usize> {
    fs::create_dir_all(destination)?;
    let mut copied = 0;

    for source in sources {
        if !source.is_dir() {
            warn!(source = %source.display(), "install tree missing; nothing to deploy from it");
            continue;
        }

        for entry in WalkDir::new(source).follow_links(true) {
            let entry = entry.map_err(io::Error::other)?;
            let rel = entry
                .path()
                .strip_prefix(source)
                .map_err(io::Error::other)?;
            let target = destination.join(rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(entry.path(), &target)?;
                copied += 1;
            }
        }
        debug!(source = %source.display(), destination = %destination.display(), "deployed install tree");
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn later_trees_overwrite_earlier_ones() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("install/a");
        let b = tmp.path().join("install/b");
        fs::create_dir_all(a.join("bin")).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("bin/tool"), "a").unwrap();
        fs::write(a.join("README"), "from a").unwrap();
        fs::write(b.join("README"), "from b").unwrap();

        let dest = tmp.path().join("deploy/fs");
        let missing = tmp.path().join("install/none");
        let n = copy_trees(&[a, missing, b], &dest).unwrap();

        assert_eq!(n, 3);
        assert_eq!(fs::read_to_string(dest.join("bin/tool")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dest.join("README")).unwrap(), "from b");
    }
}
