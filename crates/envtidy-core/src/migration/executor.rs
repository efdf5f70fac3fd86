use super::summary::MigrationSummary;
use super::{MigrationItem, MigrationPlan, MigrationRecord, MigrationResult};
use crate::fsops::{copy_item, ensure_dir, is_within, resolve_path};
use crate::progress::{Phase, ProgressReporter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The fixed directory layout created under every migration target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    pub projects: PathBuf,
    pub tools: PathBuf,
    pub configs: PathBuf,
    pub scripts: PathBuf,
    pub docs: PathBuf,
}

impl TargetLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            projects: root.join("Projects"),
            tools: root.join("Tools"),
            configs: root.join("Configs"),
            scripts: root.join("Scripts"),
            docs: root.join("Documentation"),
        }
    }

    pub fn dirs(&self) -> [&Path; 5] {
        [
            self.projects.as_path(),
            self.tools.as_path(),
            self.configs.as_path(),
            self.scripts.as_path(),
            self.docs.as_path(),
        ]
    }
}

pub struct MigrationExecutor {
    plan: MigrationPlan,
}

impl MigrationExecutor {
    pub fn new(plan: MigrationPlan) -> Self {
        Self { plan }
    }

    /// Copy every selected item into the target layout.
    ///
    /// Per-item failures land in `errors` and never stop the batch. Nothing is
    /// rolled back; re-running is safe because existing destinations are
    /// re-checked against the merge policy.
    pub fn migrate(&self, reporter: &dyn ProgressReporter) -> MigrationResult {
        let plan = &self.plan;
        let target = &plan.target_directory;
        let mut result = MigrationResult::default();

        info!(
            "Migrating {} item(s) to {}",
            plan.selected_items.len(),
            target.display()
        );
        reporter.on_phase_start(Phase::Migrate);
        let start = Instant::now();

        let backup_root = if plan.create_backup {
            self.create_backup_root(&mut result)
        } else {
            None
        };

        let layout = TargetLayout::new(target);
        let mut layout_ready = true;
        for dir in layout.dirs() {
            match ensure_dir(dir) {
                Ok(()) => reporter.on_line(&format!("Created directory: {}", dir.display())),
                Err(e) => {
                    let error = format!("Could not create directory {}: {}", dir.display(), e);
                    warn!("{}", error);
                    result.errors.push(error);
                    layout_ready = false;
                }
            }
        }

        if layout_ready {
            let mut items: Vec<&MigrationItem> = plan.selected_items.iter().collect();
            items.sort_by_key(|item| item.rank());

            for item in items {
                self.migrate_item(item, &layout, backup_root.as_deref(), &mut result, reporter);
            }
        }

        reporter.on_phase_complete(
            Phase::Migrate,
            result.migrated_count(),
            start.elapsed().as_secs_f64(),
        );

        match MigrationSummary::new(plan, &result).write() {
            Ok(path) => {
                reporter.on_line(&format!("Migration summary saved to: {}", path.display()));
            }
            Err(e) => {
                let error = format!("Could not write migration summary: {}", e);
                warn!("{}", error);
                result.errors.push(error);
            }
        }

        info!(
            "Migration finished: {} item(s) migrated, {} error(s)",
            result.migrated_count(),
            result.errors.len()
        );
        result
    }

    fn create_backup_root(&self, result: &mut MigrationResult) -> Option<PathBuf> {
        let timestamp = chrono::Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let backup_root = self
            .plan
            .target_directory
            .join("migration-backup")
            .join(timestamp);

        match ensure_dir(&backup_root) {
            Ok(()) => {
                result.backup_location = Some(backup_root.clone());
                Some(backup_root)
            }
            Err(e) => {
                let error = format!(
                    "Could not create backup directory {}: {}",
                    backup_root.display(),
                    e
                );
                warn!("{}", error);
                result.errors.push(error);
                None
            }
        }
    }

    fn migrate_item(
        &self,
        item: &MigrationItem,
        layout: &TargetLayout,
        backup_root: Option<&Path>,
        result: &mut MigrationResult,
        reporter: &dyn ProgressReporter,
    ) {
        let source = item.source_path();
        reporter.on_line(&progress_line(item));

        let name = match source.file_name() {
            Some(name) => name.to_os_string(),
            None => {
                result
                    .errors
                    .push(error_line(item, "source path has no file name"));
                return;
            }
        };

        let (destination, backup_subpath) = match item {
            MigrationItem::Tool(tool) => (
                layout.tools.join(&tool.tool_type).join(&name),
                Path::new("tools").join(&tool.tool_type).join(&name),
            ),
            MigrationItem::ProjectGroup(_) => (
                layout.projects.join(&name),
                Path::new("projects").join(&name),
            ),
            MigrationItem::Config(_) => (
                layout.configs.join(&name),
                Path::new("configs").join(&name),
            ),
        };
        let backup_path = backup_root.map(|root| root.join(&backup_subpath));

        let in_place = resolve_path(source) == resolve_path(&destination);
        let mut guarded: Vec<&PathBuf> = backup_path.iter().collect();
        if !in_place {
            guarded.push(&destination);
        }
        if let Some(path) = guarded.into_iter().find(|path| is_within(path, source)) {
            result.errors.push(error_line(
                item,
                &format!("destination {} lies inside the source", path.display()),
            ));
            return;
        }

        if let Some(backup_path) = &backup_path {
            if source.exists() {
                if let Err(e) = copy_item(source, backup_path) {
                    let error = format!("Backup failed for {}: {}", item.name(), e);
                    warn!("{}", error);
                    result.errors.push(error);
                }
            }
        }

        if !self.plan.merge_existing && fs::symlink_metadata(&destination).is_ok() {
            debug!(
                "Skipping {}: {} already exists",
                item.name(),
                destination.display()
            );
            return;
        }

        if in_place {
            reporter.on_line(&format!("Already in place: {}", destination.display()));
            record_success(item, destination, result);
            return;
        }

        match copy_item(source, &destination) {
            Ok(files) => {
                debug!(
                    "Copied {} file(s) from {} to {}",
                    files,
                    source.display(),
                    destination.display()
                );
                record_success(item, destination, result);
            }
            Err(e) => {
                let error = error_line(item, &e.to_string());
                warn!("{}", error);
                result.errors.push(error);
            }
        }
    }
}

fn record_success(item: &MigrationItem, destination: PathBuf, result: &mut MigrationResult) {
    let record = MigrationRecord {
        name: item.name(),
        original_path: item.source_path().to_path_buf(),
        new_path: destination,
        project_count: match item {
            MigrationItem::ProjectGroup(p) => Some(p.project_count),
            _ => None,
        },
    };
    result.total_files_migrated += item.migrated_count();
    match item {
        MigrationItem::Tool(_) => result.migrated_tools.push(record),
        MigrationItem::ProjectGroup(_) => result.migrated_projects.push(record),
        MigrationItem::Config(_) => result.migrated_configs.push(record),
    }
}

fn progress_line(item: &MigrationItem) -> String {
    match item {
        MigrationItem::Tool(t) => format!("Migrating tool: {}", t.name),
        MigrationItem::ProjectGroup(p) => format!("Migrating projects from: {}", p.path.display()),
        MigrationItem::Config(c) => format!("Migrating config: {}", c.name),
    }
}

fn error_line(item: &MigrationItem, message: &str) -> String {
    match item {
        MigrationItem::Tool(t) => format!("Error migrating tool {}: {}", t.name, message),
        MigrationItem::ProjectGroup(p) => {
            format!("Error migrating projects from {}: {}", p.path.display(), message)
        }
        MigrationItem::Config(c) => format!("Error migrating config {}: {}", c.name, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{ConfigEntry, ToolItem};
    use tempfile::tempdir;

    #[test]
    fn layout_has_five_fixed_dirs() {
        let layout = TargetLayout::new(Path::new("/t"));
        let names: Vec<String> = layout
            .dirs()
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["Projects", "Tools", "Configs", "Scripts", "Documentation"]
        );
    }

    #[test]
    fn refuses_to_migrate_source_into_itself() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("Projects");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();

        let plan = MigrationPlan::new(source.join("relocated"))
            .with_backup(false)
            .with_items(vec![MigrationItem::ProjectGroup(crate::migration::ProjectGroup {
                path: source.clone(),
                project_count: 1,
                size: 1,
                projects: Vec::new(),
            })]);
        let result = MigrationExecutor::new(plan).migrate(&crate::SilentReporter);

        assert_eq!(result.migrated_count(), 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("lies inside the source"));
    }

    #[test]
    fn items_run_in_kind_order() {
        let tmp = tempdir().unwrap();
        let cfg = tmp.path().join(".npmrc");
        fs::write(&cfg, "registry=x").unwrap();
        let tool_dir = tmp.path().join("node");
        fs::create_dir_all(&tool_dir).unwrap();
        fs::write(tool_dir.join("node.exe"), "bin").unwrap();

        let plan = MigrationPlan::new(tmp.path().join("target"))
            .with_backup(false)
            .with_items(vec![
                MigrationItem::Config(ConfigEntry {
                    name: "NPM Config".to_string(),
                    path: cfg,
                    size: 10,
                    is_directory: false,
                }),
                MigrationItem::Tool(ToolItem {
                    name: "Node.js".to_string(),
                    path: tool_dir,
                    tool_type: "nodejs".to_string(),
                    size: 3,
                }),
            ]);
        let reporter = crate::CollectingReporter::new();
        let result = MigrationExecutor::new(plan).migrate(&reporter);

        let lines = reporter.lines();
        let tool_pos = lines.iter().position(|l| l == "Migrating tool: Node.js").unwrap();
        let cfg_pos = lines
            .iter()
            .position(|l| l == "Migrating config: NPM Config")
            .unwrap();
        assert!(tool_pos < cfg_pos);
        assert_eq!(
            result.migrated_tools[0].new_path,
            tmp.path().join("target").join("Tools").join("nodejs").join("node")
        );
        assert_eq!(result.total_files_migrated, 2);
    }
}
