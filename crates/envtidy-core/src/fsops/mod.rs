pub mod copy;
pub mod remove;

pub use copy::{copy_item, copy_tree};
pub use remove::{remove_tree, RemovalStats};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Create `dir` and all missing ancestors. A no-op when it already exists.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}

/// Count files and bytes under `path`, skipping anything unreadable.
/// A plain file reports itself.
pub fn dir_size(path: &Path) -> (u64, u64) {
    let mut files = 0u64;
    let mut bytes = 0u64;

    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if let Ok(metadata) = entry.metadata() {
            if metadata.is_file() {
                files += 1;
                bytes += metadata.len();
            }
        }
    }

    (files, bytes)
}

/// Canonical form of `path` even when its tail does not exist yet: the
/// deepest existing ancestor is canonicalized and the missing components are
/// appended as written.
pub fn resolve_path(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = fs::canonicalize(current) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// True when `path` is `ancestor` or lies beneath it, after resolving both.
pub fn is_within(path: &Path, ancestor: &Path) -> bool {
    resolve_path(path).starts_with(resolve_path(ancestor))
}
