use crate::fsops::dir_size;
use crate::migration::{DetectedProject, ProjectGroup};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker files that settle a project's type on their own, checked in order.
const TYPED_INDICATORS: &[(&str, &str)] = &[
    ("package.json", "Node.js"),
    ("requirements.txt", "Python"),
    ("setup.py", "Python"),
    ("pyproject.toml", "Python"),
    ("Cargo.toml", "Rust"),
    ("pom.xml", "Java (Maven)"),
    ("build.gradle", "Java/Kotlin (Gradle)"),
    ("build.gradle.kts", "Java/Kotlin (Gradle)"),
    ("go.mod", "Go"),
    ("composer.json", "PHP"),
    ("Gemfile", "Ruby"),
];

/// Solution/project file extensions.
const DOTNET_EXTENSIONS: &[&str] = &["sln", "csproj", "vbproj", "fsproj"];

/// Used only when nothing typed was found.
const FALLBACK_INDICATORS: &[(&str, &str)] = &[(".git", "Git Repository"), ("Dockerfile", "Docker")];

/// Recorded but never enough to call a directory a project.
const SUPPORTING_INDICATORS: &[&str] = &[
    "CMakeLists.txt",
    "Makefile",
    "docker-compose.yml",
    "tsconfig.json",
    ".gitignore",
    "README.md",
    "LICENSE",
];

/// Returns the project type and every indicator present, or `None` when
/// `dir` does not look like a project.
pub fn classify_project(dir: &Path) -> Option<(String, Vec<String>)> {
    let mut indicators: Vec<String> = Vec::new();
    let mut project_type: Option<&str> = None;

    for (file, kind) in TYPED_INDICATORS {
        if dir.join(file).exists() {
            indicators.push(file.to_string());
            project_type.get_or_insert(*kind);
        }
    }

    let dotnet: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter_map(|entry| {
                    let path = entry.path();
                    let ext = path.extension()?.to_string_lossy().to_lowercase();
                    if DOTNET_EXTENSIONS.contains(&ext.as_str()) {
                        Some(entry.file_name().to_string_lossy().into_owned())
                    } else {
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    if !dotnet.is_empty() {
        project_type.get_or_insert("C#/.NET");
        indicators.extend(dotnet);
    }

    for (file, kind) in FALLBACK_INDICATORS {
        if dir.join(file).exists() {
            indicators.push(file.to_string());
            project_type.get_or_insert(*kind);
        }
    }

    for file in SUPPORTING_INDICATORS {
        if dir.join(file).exists() {
            indicators.push(file.to_string());
        }
    }

    project_type.map(|kind| (kind.to_string(), indicators))
}

/// One group per root directory that directly contains at least one project.
pub fn discover_projects(roots: &[PathBuf]) -> Vec<ProjectGroup> {
    let mut groups = Vec::new();

    for root in roots {
        if !root.is_dir() {
            continue;
        }
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Could not list {}: {}", root.display(), e);
                continue;
            }
        };

        let mut projects: Vec<DetectedProject> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let path = entry.path();
                let (project_type, indicators) = classify_project(&path)?;
                Some(DetectedProject {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    size: dir_size(&path).1,
                    path,
                    project_type,
                    indicators,
                })
            })
            .collect();

        if projects.is_empty() {
            continue;
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("{} project(s) under {}", projects.len(), root.display());
        groups.push(ProjectGroup {
            path: root.clone(),
            project_count: projects.len() as u64,
            size: dir_size(root).1,
            projects,
        });
    }

    groups
}
