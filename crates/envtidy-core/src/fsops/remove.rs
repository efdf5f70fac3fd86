use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::AddAssign;
use std::path::Path;
use tracing::debug;

/// Files and bytes actually removed by a removal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalStats {
    pub files_removed: u64,
    pub bytes_freed: u64,
}

impl AddAssign for RemovalStats {
    fn add_assign(&mut self, other: Self) {
        self.files_removed += other.files_removed;
        self.bytes_freed += other.bytes_freed;
    }
}

/// Delete a file or a whole directory tree, depth first.
///
/// Never fails: an entry that cannot be inspected or removed is skipped and
/// contributes nothing to the returned stats. Symlinks are unlinked, never
/// followed.
pub fn remove_tree(path: &Path) -> RemovalStats {
    let mut stats = RemovalStats::default();

    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) => {
            debug!("Skipping {}: {}", path.display(), e);
            return stats;
        }
    };

    if metadata.is_dir() {
        match fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    stats += remove_tree(&entry.path());
                }
            }
            Err(e) => debug!("Could not list {}: {}", path.display(), e),
        }
        if let Err(e) = fs::remove_dir(path) {
            debug!("Could not remove directory {}: {}", path.display(), e);
        }
    } else {
        match fs::remove_file(path) {
            Ok(()) => {
                stats.files_removed += 1;
                stats.bytes_freed += metadata.len();
            }
            Err(e) => debug!("Could not remove {}: {}", path.display(), e),
        }
    }

    stats
}
