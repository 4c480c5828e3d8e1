// Directory traversal shared by the recorder and the structure checker

use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use super::error::HashUtilityError;
use super::path_utils;

/// Item produced while walking a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    Dir { key: String },
    File { key: String, path: PathBuf },
}

/// Walk `root` depth-first in sorted order
///
/// Yields directories and regular files below the root. Symbolic links are
/// never followed nor reported, and any path listed in `exclude` is skipped.
/// Entries that cannot be read are logged and skipped.
pub fn walk_tree<'a>(root: &'a Path, exclude: &'a [PathBuf]) -> impl Iterator<Item = TreeEntry> + 'a {
    WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(move |entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error walking directory: {}", e);
                    return None;
                }
            };
            if entry.depth == 0 {
                return None;
            }

            let path = entry.path();
            let file_type = entry.file_type();
            if file_type.is_symlink() {
                debug!("Skipping symbolic link {}", path.display());
                return None;
            }
            if exclude.iter().any(|excluded| excluded == &path) {
                debug!("Skipping excluded path {}", path.display());
                return None;
            }

            if path.to_str().is_none() {
                debug!("Non UTF-8 path stored lossily: {}", path.display());
            }
            let key = match path.strip_prefix(root).ok().and_then(path_utils::to_manifest_path) {
                Some(key) => key,
                None => {
                    warn!("Cannot express {} relative to {}", path.display(), root.display());
                    return None;
                }
            };

            if file_type.is_dir() {
                Some(TreeEntry::Dir { key })
            } else if file_type.is_file() {
                Some(TreeEntry::File { key, path })
            } else {
                debug!("Skipping special file {}", path.display());
                None
            }
        })
}

/// Only the regular files of a tree
pub fn walk_files<'a>(root: &'a Path, exclude: &'a [PathBuf]) -> impl Iterator<Item = (String, PathBuf)> + 'a {
    walk_tree(root, exclude).filter_map(|entry| match entry {
        TreeEntry::File { key, path } => Some((key, path)),
        TreeEntry::Dir { .. } => None,
    })
}

/// Canonical form of a tree root, which must be an existing directory
pub fn canonical_root(root: &Path) -> Result<PathBuf, HashUtilityError> {
    let canonical = root.canonicalize().map_err(|_| HashUtilityError::DirectoryNotFound {
        path: root.to_path_buf(),
    })?;
    if !canonical.is_dir() {
        return Err(HashUtilityError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(canonical)
}
