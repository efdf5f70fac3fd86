use crate::fsops::{remove_tree, RemovalStats};
use crate::progress::ProgressReporter;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A cache/temp location to clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepPattern {
    /// A single file or directory.
    Exact(PathBuf),
    /// Every direct child of `base_dir` whose name starts with `prefix`.
    /// `base_dir` itself never matches.
    Prefix { base_dir: PathBuf, prefix: String },
}

impl SweepPattern {
    /// `.../Temp/npm-*` becomes a prefix pattern on `.../Temp` with prefix
    /// `npm-`; anything without a trailing wildcard is exact.
    pub fn parse(path: &Path) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        match (name, path.parent()) {
            (Some(name), Some(parent)) if name.ends_with('*') => SweepPattern::Prefix {
                base_dir: parent.to_path_buf(),
                prefix: name.trim_end_matches('*').to_string(),
            },
            _ => SweepPattern::Exact(path.to_path_buf()),
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            SweepPattern::Exact(path) => path
                .file_name()
                .map(|n| n.to_string_lossy() == name)
                .unwrap_or(false),
            SweepPattern::Prefix { prefix, .. } => name.starts_with(prefix.as_str()),
        }
    }

    /// Paths currently on disk that this pattern selects.
    pub fn resolve(&self) -> io::Result<Vec<PathBuf>> {
        match self {
            SweepPattern::Exact(path) => Ok(if fs::symlink_metadata(path).is_ok() {
                vec![path.clone()]
            } else {
                Vec::new()
            }),
            SweepPattern::Prefix { base_dir, .. } => {
                let entries = match fs::read_dir(base_dir) {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                    Err(e) => return Err(e),
                };
                let mut matched: Vec<PathBuf> = entries
                    .flatten()
                    .filter(|entry| self.matches_name(&entry.file_name().to_string_lossy()))
                    .map(|entry| entry.path())
                    .collect();
                matched.sort();
                Ok(matched)
            }
        }
    }
}

impl fmt::Display for SweepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepPattern::Exact(path) => write!(f, "{}", path.display()),
            SweepPattern::Prefix { base_dir, prefix } => {
                write!(f, "{}*", base_dir.join(prefix).display())
            }
        }
    }
}

/// Remove everything the patterns select, in order.
pub fn sweep(
    patterns: &[SweepPattern],
    reporter: &dyn ProgressReporter,
    issues: &mut Vec<String>,
) -> RemovalStats {
    let mut total = RemovalStats::default();

    for pattern in patterns {
        let targets = match pattern.resolve() {
            Ok(targets) => targets,
            Err(e) => {
                let issue = format!("Could not scan {}: {}", pattern, e);
                warn!("{}", issue);
                issues.push(issue);
                continue;
            }
        };

        for target in targets {
            let stats = remove_tree(&target);
            debug!(
                "Swept {}: {} files, {} bytes",
                target.display(),
                stats.files_removed,
                stats.bytes_freed
            );
            total += stats;

            if fs::symlink_metadata(&target).is_ok() {
                let issue = format!("Could not fully remove {}", target.display());
                warn!("{}", issue);
                issues.push(issue);
            }
        }
    }

    if total.files_removed > 0 {
        reporter.on_line(&format!(
            "[OK] Cleaned {} temporary files",
            total.files_removed
        ));
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use tempfile::tempdir;

    #[test]
    fn parse_recognises_trailing_wildcard() {
        let pattern = SweepPattern::parse(Path::new("/tmp/cache/npm-*"));
        assert_eq!(
            pattern,
            SweepPattern::Prefix {
                base_dir: PathBuf::from("/tmp/cache"),
                prefix: "npm-".to_string()
            }
        );
        assert_eq!(
            SweepPattern::parse(Path::new("/home/dev/.npm/_cacache")),
            SweepPattern::Exact(PathBuf::from("/home/dev/.npm/_cacache"))
        );
        assert_eq!(pattern.to_string(), "/tmp/cache/npm-*");
    }

    #[test]
    fn prefix_matches_children_only() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().join("npm-cache");
        fs::create_dir_all(base.join("npm-123")).unwrap();
        fs::write(base.join("npm-456.log"), "x").unwrap();
        fs::write(base.join("yarn-1"), "x").unwrap();

        // The base directory's own name carries the prefix but must not match.
        let pattern = SweepPattern::Prefix {
            base_dir: base.clone(),
            prefix: "npm-".to_string(),
        };
        let matched = pattern.resolve().unwrap();

        assert_eq!(matched, vec![base.join("npm-123"), base.join("npm-456.log")]);
    }

    #[test]
    fn empty_prefix_matches_every_child() {
        let pattern = SweepPattern::parse(Path::new("/var/tmp/*"));
        assert!(pattern.matches_name("anything"));
        assert!(pattern.matches_name(""));
    }

    #[test]
    fn sweep_accumulates_and_ignores_missing() {
        let tmp = tempdir().unwrap();
        let temp = tmp.path().join("Temp");
        fs::create_dir_all(temp.join("vscode-abc").join("nested")).unwrap();
        fs::write(temp.join("vscode-abc").join("nested").join("a"), "1234").unwrap();
        fs::write(temp.join("vscode-abc").join("b"), "12").unwrap();
        fs::write(temp.join("unrelated"), "keep").unwrap();
        let logs = tmp.path().join("logs");
        fs::create_dir_all(&logs).unwrap();
        fs::write(logs.join("main.log"), "123").unwrap();

        let patterns = vec![
            SweepPattern::parse(&temp.join("vscode-*")),
            SweepPattern::Exact(logs.clone()),
            SweepPattern::Exact(tmp.path().join("missing")),
            SweepPattern::parse(&tmp.path().join("nowhere").join("npm-*")),
        ];
        let mut issues = Vec::new();
        let stats = sweep(&patterns, &SilentReporter, &mut issues);

        assert_eq!(stats.files_removed, 3);
        assert_eq!(stats.bytes_freed, 9);
        assert!(issues.is_empty());
        assert!(!logs.exists());
        assert!(!temp.join("vscode-abc").exists());
        assert!(temp.join("unrelated").exists());
    }
}
