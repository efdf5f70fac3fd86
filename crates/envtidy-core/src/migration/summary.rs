use super::{MigrationPlan, MigrationResult};
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE_NAME: &str = "migration-summary.json";

/// The record persisted at the root of every migration target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    pub timestamp: DateTime<Utc>,
    pub target_directory: PathBuf,
    pub migration_results: MigrationResult,
    pub migration_config: MigrationPlan,
}

impl MigrationSummary {
    pub fn new(plan: &MigrationPlan, result: &MigrationResult) -> Self {
        Self {
            timestamp: Utc::now(),
            target_directory: plan.target_directory.clone(),
            migration_results: result.clone(),
            migration_config: plan.clone(),
        }
    }

    /// Write pretty JSON to `<target>/migration-summary.json`, returning the path.
    pub fn write(&self) -> Result<PathBuf, Error> {
        let path = self.target_directory.join(SUMMARY_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn read(target_directory: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(target_directory.join(SUMMARY_FILE_NAME))?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn summary_round_trips_through_disk() {
        let tmp = tempdir().unwrap();
        let plan = MigrationPlan::new(tmp.path()).with_merge(false);
        let result = MigrationResult {
            errors: vec!["Error migrating config X: boom".to_string()],
            total_files_migrated: 4,
            ..MigrationResult::default()
        };

        let written = MigrationSummary::new(&plan, &result).write().unwrap();
        assert_eq!(written, tmp.path().join(SUMMARY_FILE_NAME));

        let read = MigrationSummary::read(tmp.path()).unwrap();
        assert_eq!(read.migration_results, result);
        assert_eq!(read.migration_config, plan);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written).unwrap()).unwrap();
        assert!(raw.get("timestamp").is_some());
        assert!(raw.get("targetDirectory").is_some());
        assert_eq!(raw["migrationResults"]["totalFilesMigrated"], 4);
        assert_eq!(raw["migrationConfig"]["mergeExisting"], false);
    }
}
