// Path normalization utilities
// Manifest keys are relative, `/` separated and never start with a slash

use std::path::{Component, Path, PathBuf};

/// Normalize a relative path into a manifest key
///
/// Returns None for an empty path or one that climbs out of its base.
pub fn to_manifest_path(relative: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => continue,
            Component::ParentDir => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Normalize a manifest key read back from a store
///
/// Empty and `.` segments are dropped. A backslash is an ordinary file name
/// byte on Unix, so it is only treated as a separator on Windows.
pub fn normalize_key(key: &str) -> String {
    #[cfg(windows)]
    let key = key.replace('\\', "/");

    key.split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve a manifest key against the tree root
pub fn resolve_in_root(root: &Path, key: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in key.split('/') {
        path.push(part);
    }
    path
}

/// Parent keys of a manifest key, outermost first (`a/b/c` -> `a`, `a/b`)
pub fn parent_keys(key: &str) -> Vec<&str> {
    key.match_indices('/').map(|(i, _)| &key[..i]).collect()
}

/// Absolute form of a path that may not exist yet, for exclusion checks
pub fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // Not created yet: canonicalize the parent and re-attach the file name
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
