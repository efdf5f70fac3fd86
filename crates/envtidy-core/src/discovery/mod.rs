pub mod projects;

pub use projects::{classify_project, discover_projects};

use crate::fsops::dir_size;
use crate::migration::{ConfigEntry, MigrationItem, ProjectGroup, ToolItem};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Where to look for one tool. A path whose last component contains `*` is
/// matched case-insensitively against the children of its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProbe {
    pub name: String,
    #[serde(rename = "type")]
    pub tool_type: String,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProbe {
    pub name: String,
    pub path: PathBuf,
}

/// Everything found on disk that could be selected for migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub tools: Vec<ToolItem>,
    pub project_directories: Vec<ProjectGroup>,
    pub configuration_files: Vec<ConfigEntry>,
    pub total_files_found: u64,
}

impl ScanReport {
    pub fn into_items(self) -> Vec<MigrationItem> {
        let mut items: Vec<MigrationItem> = Vec::new();
        items.extend(self.tools.into_iter().map(MigrationItem::Tool));
        items.extend(
            self.project_directories
                .into_iter()
                .map(MigrationItem::ProjectGroup),
        );
        items.extend(self.configuration_files.into_iter().map(MigrationItem::Config));
        items
    }
}

pub fn scan(
    tool_probes: &[ToolProbe],
    project_roots: &[PathBuf],
    config_probes: &[ConfigProbe],
) -> ScanReport {
    let configuration_files = discover_configs(config_probes);
    ScanReport {
        tools: discover_tools(tool_probes),
        project_directories: discover_projects(project_roots),
        total_files_found: configuration_files.len() as u64,
        configuration_files,
    }
}

pub fn discover_tools(probes: &[ToolProbe]) -> Vec<ToolItem> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut tools = Vec::new();

    for probe in probes {
        for search_path in &probe.paths {
            for (name, path) in expand_probe_path(&probe.name, search_path) {
                if !seen.insert(path.clone()) {
                    continue;
                }
                debug!("Found {} at {}", name, path.display());
                tools.push(ToolItem {
                    name,
                    size: dir_size(&path).1,
                    path,
                    tool_type: probe.tool_type.clone(),
                });
            }
        }
    }

    tools
}

fn expand_probe_path(tool_name: &str, search_path: &Path) -> Vec<(String, PathBuf)> {
    let file_name = search_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !file_name.contains('*') {
        return if search_path.exists() {
            vec![(tool_name.to_string(), search_path.to_path_buf())]
        } else {
            Vec::new()
        };
    }

    let pattern = match Pattern::new(&file_name) {
        Ok(p) => p,
        Err(e) => {
            error!("Invalid glob pattern '{}': {}", file_name, e);
            return Vec::new();
        }
    };
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let base = match search_path.parent() {
        Some(base) => base,
        None => return Vec::new(),
    };
    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut matches: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let child = entry.file_name().to_string_lossy().into_owned();
            if pattern.matches_with(&child, options) {
                Some((format!("{} ({})", tool_name, child), entry.path()))
            } else {
                None
            }
        })
        .collect();
    matches.sort_by(|a, b| a.1.cmp(&b.1));
    matches
}

pub fn discover_configs(probes: &[ConfigProbe]) -> Vec<ConfigEntry> {
    probes
        .iter()
        .filter_map(|probe| {
            let metadata = fs::metadata(&probe.path).ok()?;
            let size = if metadata.is_dir() {
                dir_size(&probe.path).1
            } else {
                metadata.len()
            };
            Some(ConfigEntry {
                name: probe.name.clone(),
                path: probe.path.clone(),
                size,
                is_directory: metadata.is_dir(),
            })
        })
        .collect()
}
