pub mod executor;
pub mod summary;

pub use executor::{MigrationExecutor, TargetLayout};
pub use summary::{MigrationSummary, SUMMARY_FILE_NAME};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A tool installation found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolItem {
    pub name: String,
    pub path: PathBuf,
    /// Namespace under `Tools/`, e.g. `nodejs` or `python`.
    #[serde(rename = "type")]
    pub tool_type: String,
    #[serde(default)]
    pub size: u64,
}

/// A single project detected inside a project group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedProject {
    pub name: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub project_type: String,
    pub indicators: Vec<String>,
    pub size: u64,
}

/// A directory holding one or more projects, migrated as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub path: PathBuf,
    pub project_count: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub projects: Vec<DetectedProject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MigrationItem {
    Tool(ToolItem),
    ProjectGroup(ProjectGroup),
    Config(ConfigEntry),
}

impl MigrationItem {
    pub fn source_path(&self) -> &Path {
        match self {
            MigrationItem::Tool(t) => &t.path,
            MigrationItem::ProjectGroup(p) => &p.path,
            MigrationItem::Config(c) => &c.path,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            MigrationItem::Tool(t) => t.size,
            MigrationItem::ProjectGroup(p) => p.size,
            MigrationItem::Config(c) => c.size,
        }
    }

    /// Label used in progress lines and records.
    pub fn name(&self) -> String {
        match self {
            MigrationItem::Tool(t) => t.name.clone(),
            MigrationItem::ProjectGroup(p) => p.path.display().to_string(),
            MigrationItem::Config(c) => c.name.clone(),
        }
    }

    /// Migration order: tools, then projects, then configs.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            MigrationItem::Tool(_) => 0,
            MigrationItem::ProjectGroup(_) => 1,
            MigrationItem::Config(_) => 2,
        }
    }

    /// Contribution to `total_files_migrated` on success.
    pub(crate) fn migrated_count(&self) -> u64 {
        match self {
            MigrationItem::ProjectGroup(p) => p.project_count,
            _ => 1,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub target_directory: PathBuf,
    #[serde(default)]
    pub selected_items: Vec<MigrationItem>,
    #[serde(default = "default_true")]
    pub create_backup: bool,
    /// When false an existing destination blocks the item.
    #[serde(default = "default_true")]
    pub merge_existing: bool,
}

impl MigrationPlan {
    pub fn new(target_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_directory: target_directory.into(),
            selected_items: Vec::new(),
            create_backup: true,
            merge_existing: true,
        }
    }

    pub fn with_items(mut self, items: Vec<MigrationItem>) -> Self {
        self.selected_items = items;
        self
    }

    pub fn with_backup(mut self, create_backup: bool) -> Self {
        self.create_backup = create_backup;
        self
    }

    pub fn with_merge(mut self, merge_existing: bool) -> Self {
        self.merge_existing = merge_existing;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub name: String,
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub migrated_tools: Vec<MigrationRecord>,
    pub migrated_projects: Vec<MigrationRecord>,
    pub migrated_configs: Vec<MigrationRecord>,
    pub errors: Vec<String>,
    pub backup_location: Option<PathBuf>,
    pub total_files_migrated: u64,
}

impl MigrationResult {
    pub fn migrated_count(&self) -> usize {
        self.migrated_tools.len() + self.migrated_projects.len() + self.migrated_configs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_defaults_when_fields_missing() {
        let plan: MigrationPlan = serde_json::from_str(
            r#"{
                "targetDirectory": "/new/root",
                "selectedItems": [
                    {"kind": "tool", "name": "Node.js", "path": "/opt/node", "type": "nodejs"},
                    {"kind": "projectGroup", "path": "/home/dev/Projects", "projectCount": 3},
                    {"kind": "config", "name": "Git Config", "path": "/home/dev/.gitconfig"}
                ]
            }"#,
        )
        .unwrap();

        assert!(plan.create_backup);
        assert!(plan.merge_existing);
        assert_eq!(plan.selected_items.len(), 3);
        match &plan.selected_items[0] {
            MigrationItem::Tool(tool) => assert_eq!(tool.tool_type, "nodejs"),
            other => panic!("unexpected item {:?}", other),
        }
        assert_eq!(plan.selected_items[1].migrated_count(), 3);
        assert_eq!(plan.selected_items[2].migrated_count(), 1);
        assert_eq!(
            plan.selected_items[2].source_path(),
            Path::new("/home/dev/.gitconfig")
        );
    }

    #[test]
    fn item_serializes_with_kind_tag() {
        let item = MigrationItem::Config(ConfigEntry {
            name: "SSH Keys".to_string(),
            path: PathBuf::from("/home/dev/.ssh"),
            size: 10,
            is_directory: true,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "config");
        assert_eq!(json["isDirectory"], true);
    }
}
