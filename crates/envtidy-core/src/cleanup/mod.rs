pub mod dedupe;
pub mod sweep;

pub use dedupe::{dedupe_category, FileRecord};
pub use sweep::{sweep, SweepPattern};

use crate::fsops::ensure_dir;
use crate::hasher::{FingerprintMode, Fingerprinter};
use crate::progress::{Phase, ProgressReporter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// A named set of locations believed to hold the same configuration
/// artifact. Earlier candidates are preferred as survivors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupCategory {
    pub name: String,
    pub candidates: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOutcome {
    pub name: String,
    pub files_removed: u64,
    pub space_freed_bytes: u64,
    pub survivors: Vec<PathBuf>,
}

impl CategoryOutcome {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    /// Duplicates plus swept temp files.
    pub files_removed: u64,
    pub space_freed_bytes: u64,
    pub categories: Vec<CategoryOutcome>,
    pub temp_files_removed: u64,
    pub temp_space_freed_bytes: u64,
    pub backup_root: Option<PathBuf>,
    /// One line per category that lost at least one file.
    pub cleaned: Vec<String>,
    pub issues: Vec<String>,
    pub summary: String,
}

pub struct CleanupEngine {
    categories: Vec<CleanupCategory>,
    sweep_patterns: Vec<SweepPattern>,
    backup_base: PathBuf,
    fingerprinter: Fingerprinter,
}

impl CleanupEngine {
    pub fn new(
        categories: Vec<CleanupCategory>,
        sweep_patterns: Vec<SweepPattern>,
        backup_base: PathBuf,
    ) -> Self {
        Self {
            categories,
            sweep_patterns,
            backup_base,
            fingerprinter: Fingerprinter::default(),
        }
    }

    pub fn with_fingerprint_mode(mut self, mode: FingerprintMode) -> Self {
        self.fingerprinter = Fingerprinter::new(mode);
        self
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Fingerprinter) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Run the full cleanup:
    /// 1. Create the date-stamped backup root
    /// 2. Deduplicate every category in table order
    /// 3. Sweep cache/temp locations
    /// 4. Summarise
    pub fn run(&self, reporter: &dyn ProgressReporter) -> CleanupResult {
        let mut result = CleanupResult::default();

        let backup_root = self
            .backup_base
            .join(chrono::Utc::now().format("%Y-%m-%d").to_string());
        match ensure_dir(&backup_root) {
            Ok(()) => {
                reporter.on_line(&format!(
                    "[INFO] Created backup directory: {}",
                    backup_root.display()
                ));
                result.backup_root = Some(backup_root.clone());
            }
            Err(e) => {
                let issue = format!(
                    "Could not create backup directory {}: {}",
                    backup_root.display(),
                    e
                );
                warn!("{}", issue);
                reporter.on_line(&format!("[WARN] {}", issue));
                result.issues.push(issue);
            }
        }

        // Phase 1: Deduplicate
        info!("Scanning {} categories for duplicates...", self.categories.len());
        reporter.on_phase_start(Phase::Dedupe);
        let dedupe_start = Instant::now();
        for category in &self.categories {
            reporter.on_line(&format!("[INFO] Checking {} for duplicates...", category.name));
            let outcome = dedupe_category(
                category,
                &backup_root,
                &self.fingerprinter,
                reporter,
                &mut result.issues,
            );

            result.files_removed += outcome.files_removed;
            result.space_freed_bytes += outcome.space_freed_bytes;
            if outcome.files_removed > 0 {
                result.cleaned.push(format!(
                    "{}: {} duplicates removed",
                    outcome.name, outcome.files_removed
                ));
            }
            result.categories.push(outcome);
        }
        reporter.on_phase_complete(
            Phase::Dedupe,
            result.files_removed as usize,
            dedupe_start.elapsed().as_secs_f64(),
        );

        // Phase 2: Sweep
        reporter.on_phase_start(Phase::Sweep);
        let sweep_start = Instant::now();
        let swept = sweep(&self.sweep_patterns, reporter, &mut result.issues);
        reporter.on_phase_complete(
            Phase::Sweep,
            swept.files_removed as usize,
            sweep_start.elapsed().as_secs_f64(),
        );
        result.temp_files_removed = swept.files_removed;
        result.temp_space_freed_bytes = swept.bytes_freed;
        result.files_removed += swept.files_removed;
        result.space_freed_bytes += swept.bytes_freed;

        result.summary = summarize(result.files_removed, result.space_freed_bytes);
        if result.files_removed > 0 {
            reporter.on_line(&format!(
                "[OK] Cleanup completed: {} files removed, {} MB freed",
                result.files_removed,
                format_megabytes(result.space_freed_bytes)
            ));
            if let Some(root) = &result.backup_root {
                reporter.on_line(&format!("[INFO] Backup created at: {}", root.display()));
            }
        } else {
            reporter.on_line("[OK] No duplicate files found - system is clean");
        }
        info!("{}", result.summary);

        result
    }
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

fn summarize(files_removed: u64, bytes: u64) -> String {
    if files_removed > 0 {
        format!(
            "Cleaned up {} duplicate files, freed {} MB",
            files_removed,
            format_megabytes(bytes)
        )
    } else {
        "No duplicate files found - system already clean".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_wording() {
        assert_eq!(
            summarize(0, 0),
            "No duplicate files found - system already clean"
        );
        assert_eq!(
            summarize(3, 3 * 1024 * 1024 / 2),
            "Cleaned up 3 duplicate files, freed 1.50 MB"
        );
    }
}
