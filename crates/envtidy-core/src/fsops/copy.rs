use super::{is_within, resolve_path};
use crate::error::Error;
use std::fs;
use std::io;
use std::path::Path;
#[cfg(not(unix))]
use tracing::debug;
use tracing::trace;

fn copy_error(src: &Path, dest: &Path, source: io::Error) -> Error {
    Error::Copy {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source,
    }
}

fn overlap_error(src: &Path, dest: &Path, message: &str) -> Error {
    copy_error(src, dest, io::Error::new(io::ErrorKind::InvalidInput, message))
}

/// Recursively copy the directory `src` into `dest`, creating `dest` and its
/// ancestors when missing. Existing files under `dest` are overwritten,
/// anything else already there is left alone. Symlinks are recreated, never
/// followed.
///
/// Refuses when `dest` is `src` or lies inside it. Returns the number of
/// files copied. Timestamps and permissions are not preserved beyond what
/// `fs::copy` does on the platform.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<u64, Error> {
    if is_within(dest, src) {
        return Err(overlap_error(
            src,
            dest,
            "destination is the source or lies inside it",
        ));
    }
    copy_dir_contents(src, dest)
}

fn copy_dir_contents(src: &Path, dest: &Path) -> Result<u64, Error> {
    fs::create_dir_all(dest).map_err(|e| copy_error(src, dest, e))?;

    let entries = fs::read_dir(src).map_err(|e| copy_error(src, dest, e))?;
    let mut copied = 0u64;

    for entry in entries {
        let entry = entry.map_err(|e| copy_error(src, dest, e))?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        let metadata =
            fs::symlink_metadata(&src_path).map_err(|e| copy_error(&src_path, &dest_path, e))?;
        if metadata.file_type().is_symlink() {
            copied += copy_symlink(&src_path, &dest_path)?;
        } else if metadata.is_dir() {
            copied += copy_dir_contents(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(|e| copy_error(&src_path, &dest_path, e))?;
            copied += 1;
        }
    }

    trace!("Copied {} files from {} to {}", copied, src.display(), dest.display());
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<u64, Error> {
    let link_target = fs::read_link(src).map_err(|e| copy_error(src, dest, e))?;
    if let Ok(existing) = fs::symlink_metadata(dest) {
        if !existing.is_dir() {
            fs::remove_file(dest).map_err(|e| copy_error(src, dest, e))?;
        }
    }
    std::os::unix::fs::symlink(&link_target, dest).map_err(|e| copy_error(src, dest, e))?;
    Ok(1)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dest: &Path) -> Result<u64, Error> {
    debug!("Skipping symlink {}", src.display());
    Ok(0)
}

/// Copy a file or a directory tree. Parents of a file destination are created
/// as needed. Copying a file onto itself is refused instead of truncating it.
pub fn copy_item(src: &Path, dest: &Path) -> Result<u64, Error> {
    let metadata = fs::metadata(src).map_err(|e| copy_error(src, dest, e))?;
    if metadata.is_dir() {
        return copy_tree(src, dest);
    }

    if resolve_path(src) == resolve_path(dest) {
        return Err(overlap_error(src, dest, "source and destination are the same file"));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| copy_error(src, dest, e))?;
    }
    fs::copy(src, dest).map_err(|e| copy_error(src, dest, e))?;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_nested_tree_verbatim() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("a").join("b")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("root.txt"), "root").unwrap();
        fs::write(src.join("a").join("b").join("leaf.bin"), [0u8, 1, 2, 255]).unwrap();

        let dest = tmp.path().join("out").join("deeper").join("dest");
        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("root.txt")).unwrap(), "root");
        assert_eq!(
            fs::read(dest.join("a").join("b").join("leaf.bin")).unwrap(),
            vec![0u8, 1, 2, 255]
        );
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn copy_into_existing_destination_merges() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("shared.txt"), "new").unwrap();
        fs::write(dest.join("shared.txt"), "old").unwrap();
        fs::write(dest.join("keep.txt"), "keep").unwrap();

        copy_tree(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("shared.txt")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dest.join("keep.txt")).unwrap(), "keep");
    }

    #[test]
    fn missing_source_names_both_paths() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("missing");
        let dest = tmp.path().join("dest");

        let err = copy_tree(&src, &dest).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&src.display().to_string()));
        assert!(message.contains(&dest.display().to_string()));
    }

    #[test]
    fn copy_item_handles_single_files() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join(".gitconfig");
        fs::write(&src, "[user]\n\tname = dev\n").unwrap();

        let dest = tmp.path().join("Configs").join(".gitconfig");
        assert_eq!(copy_item(&src, &dest).unwrap(), 1);
        assert_eq!(fs::read(&dest).unwrap(), fs::read(&src).unwrap());
    }

    #[test]
    fn copy_item_refuses_file_onto_itself() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join(".gitconfig");
        fs::write(&file, "[user] name = dev").unwrap();

        let err = copy_item(&file, &tmp.path().join(".").join(".gitconfig")).unwrap_err();
        assert!(err.to_string().contains("same file"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "[user] name = dev");
    }

    #[test]
    fn copy_tree_refuses_destination_inside_source() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("Projects");
        fs::create_dir_all(src.join("api")).unwrap();
        fs::write(src.join("api").join("go.mod"), "module api").unwrap();

        let dest = src.join("Projects");
        assert!(copy_tree(&src, &dest).is_err());
        assert!(copy_tree(&src, &src).is_err());
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(&src).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_recreated_not_followed() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("project");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("main.rs"), "fn main() {}").unwrap();
        // Points back at its own parent.
        std::os::unix::fs::symlink(&src, src.join("loop")).unwrap();

        let dest = tmp.path().join("copy");
        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        let link = dest.join("loop");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), src);

        // Copying again over the existing link succeeds.
        assert_eq!(copy_tree(&src, &dest).unwrap(), 2);
    }
}
