use super::{CategoryOutcome, CleanupCategory};
use crate::fsops::ensure_dir;
use crate::hasher::{Fingerprint, Fingerprinter};
use crate::progress::ProgressReporter;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// A candidate that existed at scan time.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
    pub fingerprint: Fingerprint,
    /// Index in the category's candidate list; lower is preferred.
    pub preference: usize,
}

/// Keep one file per content group in `category`, backing up and deleting
/// the rest. Within a group the candidate with the lowest preference index
/// survives.
///
/// Missing or inaccessible candidates are skipped. Backup or delete failures
/// are pushed onto `issues` and never stop the category; a file is only
/// deleted once its backup copy exists.
pub fn dedupe_category(
    category: &CleanupCategory,
    backup_root: &Path,
    fingerprinter: &Fingerprinter,
    reporter: &dyn ProgressReporter,
    issues: &mut Vec<String>,
) -> CategoryOutcome {
    let mut outcome = CategoryOutcome::new(&category.name);

    let existing = collect_existing(&category.candidates);
    if existing.len() < 2 {
        debug!(
            "{}: {} existing candidate(s), nothing to deduplicate",
            category.name,
            existing.len()
        );
        return outcome;
    }

    let records: Vec<FileRecord> = existing
        .into_iter()
        .map(|(preference, path, metadata)| FileRecord {
            fingerprint: fingerprinter.fingerprint(&path),
            size_bytes: metadata.len(),
            modified: metadata.modified().ok(),
            path,
            preference,
        })
        .collect();

    for group in group_by_fingerprint(records) {
        let (survivor, duplicates) = match group.split_first() {
            Some(split) => split,
            None => continue,
        };
        reporter.on_line(&format!("[INFO] Keeping: {}", survivor.path.display()));
        outcome.survivors.push(survivor.path.clone());

        for duplicate in duplicates {
            match backup_and_remove(&category.name, duplicate, backup_root) {
                Ok(backup_path) => {
                    outcome.files_removed += 1;
                    outcome.space_freed_bytes += duplicate.size_bytes;
                    debug!(
                        "Backed up {} to {}",
                        duplicate.path.display(),
                        backup_path.display()
                    );
                    reporter.on_line(&format!(
                        "[OK] Removed duplicate: {}",
                        duplicate.path.display()
                    ));
                }
                Err(e) => {
                    let issue = format!("Could not remove {}: {}", duplicate.path.display(), e);
                    warn!("{}", issue);
                    reporter.on_line(&format!("[WARN] {}", issue));
                    issues.push(issue);
                }
            }
        }
    }

    if outcome.files_removed > 0 {
        info!(
            "{}: removed {} duplicate(s), {} bytes",
            category.name, outcome.files_removed, outcome.space_freed_bytes
        );
    }
    outcome
}

/// Existing regular files among `candidates`, keyed by their original index.
/// A candidate resolving to the same file as an earlier one is dropped so a
/// file can never be treated as a duplicate of itself.
fn collect_existing(candidates: &[PathBuf]) -> Vec<(usize, PathBuf, fs::Metadata)> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut existing = Vec::new();

    for (index, path) in candidates.iter().enumerate() {
        let metadata = match fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => {
                debug!("Skipping non-file candidate {}", path.display());
                continue;
            }
            Err(_) => continue,
        };

        let identity = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        if !seen.insert(identity) {
            debug!("Skipping {}: same file as an earlier candidate", path.display());
            continue;
        }

        existing.push((index, path.clone(), metadata));
    }

    existing
}

/// Partition into groups of equal fingerprint, each sorted by preference,
/// dropping singletons. Groups come back ordered by their survivor.
fn group_by_fingerprint(mut records: Vec<FileRecord>) -> Vec<Vec<FileRecord>> {
    records.sort_by_key(|r| r.preference);

    let mut index: HashMap<Fingerprint, usize> = HashMap::new();
    let mut groups: Vec<Vec<FileRecord>> = Vec::new();

    for record in records {
        match index.get(&record.fingerprint) {
            Some(&slot) => groups[slot].push(record),
            None => {
                index.insert(record.fingerprint.clone(), groups.len());
                groups.push(vec![record]);
            }
        }
    }

    groups.retain(|g| g.len() > 1);
    groups
}

fn backup_and_remove(
    category: &str,
    record: &FileRecord,
    backup_root: &Path,
) -> std::io::Result<PathBuf> {
    let backup_dir = backup_root.join(category);
    ensure_dir(&backup_dir)?;

    let backup_path = unique_backup_path(&backup_dir, &record.path);
    fs::copy(&record.path, &backup_path)?;
    fs::remove_file(&record.path)?;
    Ok(backup_path)
}

/// `<dir>/<file name>_<unix millis>`, with a counter appended if that name is
/// already taken.
pub(crate) fn unique_backup_path(dir: &Path, original: &Path) -> PathBuf {
    let name = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let base = format!("{}_{}", name, millis);
    let mut candidate = dir.join(&base);
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}", base, counter));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectingReporter, SilentReporter};
    use tempfile::tempdir;

    fn category(name: &str, paths: &[PathBuf]) -> CleanupCategory {
        CleanupCategory {
            name: name.to_string(),
            candidates: paths.to_vec(),
        }
    }

    #[test]
    fn lowest_index_survives() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.ps1");
        let b = tmp.path().join("b.ps1");
        let c = tmp.path().join("c.ps1");
        fs::write(&a, "same profile").unwrap();
        fs::write(&b, "other profile").unwrap();
        fs::write(&c, "same profile").unwrap();
        let backup = tmp.path().join("backup");

        let reporter = CollectingReporter::new();
        let mut issues = Vec::new();
        let outcome = dedupe_category(
            &category("profiles", &[a.clone(), b.clone(), c.clone()]),
            &backup,
            &Fingerprinter::default(),
            &reporter,
            &mut issues,
        );

        assert_eq!(outcome.files_removed, 1);
        assert_eq!(outcome.space_freed_bytes, "same profile".len() as u64);
        assert_eq!(outcome.survivors, vec![a.clone()]);
        assert!(a.exists() && b.exists() && !c.exists());
        assert!(issues.is_empty());
        assert!(reporter
            .lines()
            .contains(&format!("[INFO] Keeping: {}", a.display())));
    }

    #[test]
    fn single_existing_candidate_touches_nothing() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a");
        fs::write(&a, "x").unwrap();
        let backup = tmp.path().join("backup");

        let mut issues = Vec::new();
        let outcome = dedupe_category(
            &category("one", &[tmp.path().join("missing"), a.clone()]),
            &backup,
            &Fingerprinter::default(),
            &SilentReporter,
            &mut issues,
        );

        assert_eq!(outcome.files_removed, 0);
        assert_eq!(outcome.space_freed_bytes, 0);
        assert!(!backup.exists());
    }

    #[test]
    fn repeated_candidate_is_not_its_own_duplicate() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a");
        fs::write(&a, "x").unwrap();
        let spelled_differently = tmp.path().join(".").join("a");

        let mut issues = Vec::new();
        let outcome = dedupe_category(
            &category("dup", &[a.clone(), a.clone(), spelled_differently]),
            &tmp.path().join("backup"),
            &Fingerprinter::default(),
            &SilentReporter,
            &mut issues,
        );

        assert_eq!(outcome.files_removed, 0);
        assert!(a.exists());
    }

    #[test]
    fn failed_backup_keeps_original() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();

        // A file where the backup directory should be makes the backup fail.
        let backup = tmp.path().join("backup");
        fs::write(&backup, "not a directory").unwrap();

        let mut issues = Vec::new();
        let outcome = dedupe_category(
            &category("cfg", &[a.clone(), b.clone()]),
            &backup,
            &Fingerprinter::default(),
            &SilentReporter,
            &mut issues,
        );

        assert_eq!(outcome.files_removed, 0);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains(&b.display().to_string()));
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn backup_names_do_not_collide() {
        let tmp = tempdir().unwrap();
        let original = tmp.path().join("settings.json");
        let first = unique_backup_path(tmp.path(), &original);
        fs::write(&first, "taken").unwrap();
        let second = unique_backup_path(tmp.path(), &original);

        assert_ne!(first, second);
        assert!(second
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("settings.json_"));
    }

    #[test]
    fn groups_are_ordered_and_singletons_dropped() {
        let record = |p: usize, fp: u64| FileRecord {
            path: PathBuf::from(format!("/f{}", p)),
            size_bytes: 1,
            modified: None,
            fingerprint: Fingerprint::Content { len: 1, hash: fp },
            preference: p,
        };
        let groups = group_by_fingerprint(vec![
            record(4, 2),
            record(3, 1),
            record(0, 1),
            record(2, 9),
            record(1, 2),
        ]);

        let prefs: Vec<Vec<usize>> = groups
            .iter()
            .map(|g| g.iter().map(|r| r.preference).collect())
            .collect();
        assert_eq!(prefs, vec![vec![0, 3], vec![1, 4]]);
    }
}
