use crate::cleanup::{CleanupCategory, SweepPattern};
use crate::discovery::{ConfigProbe, ToolProbe};
use crate::error::Error;
use crate::hasher::fingerprint::DEFAULT_MARKER;
use crate::hasher::{FingerprintMode, Fingerprinter};
use config::{Config, ConfigError, Environment, File as ConfigFile, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProbeConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub tool_type: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProbeConfig {
    pub name: String,
    pub path: String,
}

/// Raw settings. Paths may start with `~`, which [`AppConfig::resolve`]
/// expands against the home directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backup_dir: String,
    pub fingerprint: FingerprintMode,
    pub marker: String,
    pub categories: Vec<CategoryConfig>,
    pub sweep_paths: Vec<String>,
    pub tool_probes: Vec<ToolProbeConfig>,
    pub project_roots: Vec<String>,
    pub config_probes: Vec<ConfigProbeConfig>,
}

/// Settings with every path made absolute, ready for the engines.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backup_base: PathBuf,
    pub fingerprinter: Fingerprinter,
    pub categories: Vec<CleanupCategory>,
    pub sweep_patterns: Vec<SweepPattern>,
    pub tool_probes: Vec<ToolProbe>,
    pub project_roots: Vec<PathBuf>,
    pub config_probes: Vec<ConfigProbe>,
}

/// Load `Config.toml` (optional) overlaid with `ENVTIDY_*` environment
/// variables. Anything not set falls back to the built-in tables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("ENVTIDY"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path).required(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

pub fn load_from_toml(source: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from_str(source, FileFormat::Toml))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

pub fn home_dir() -> Result<PathBuf, Error> {
    dirs::home_dir().ok_or_else(|| Error::Other("Could not determine home directory".to_string()))
}

/// Expand a leading `~` and split on either separator so table entries work
/// on every platform.
pub fn expand_path(raw: &str, home: &Path) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
        _ => return PathBuf::from(raw),
    };

    let mut path = home.to_path_buf();
    for part in rest.split(['/', '\\']).filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for dir in dirs {
        if result.iter().any(|kept| dir.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(&dir));
        result.push(dir);
    }

    result
}

impl AppConfig {
    pub fn resolve(&self, home: &Path) -> ResolvedConfig {
        let expand = |raw: &String| expand_path(raw, home);

        ResolvedConfig {
            backup_base: expand_path(&self.backup_dir, home),
            fingerprinter: Fingerprinter::new(self.fingerprint).with_marker(&self.marker),
            categories: self
                .categories
                .iter()
                .map(|c| CleanupCategory {
                    name: c.name.clone(),
                    candidates: c.paths.iter().map(expand).collect(),
                })
                .collect(),
            sweep_patterns: self
                .sweep_paths
                .iter()
                .map(|p| SweepPattern::parse(&expand(p)))
                .collect(),
            tool_probes: self
                .tool_probes
                .iter()
                .map(|t| ToolProbe {
                    name: t.name.clone(),
                    tool_type: t.tool_type.clone(),
                    paths: t.paths.iter().map(expand).collect(),
                })
                .collect(),
            project_roots: non_overlapping_directories(
                self.project_roots.iter().map(expand).collect(),
            ),
            config_probes: self
                .config_probes
                .iter()
                .map(|c| ConfigProbe {
                    name: c.name.clone(),
                    path: expand(&c.path),
                })
                .collect(),
        }
    }
}

fn category(name: &str, paths: &[&str]) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        paths: strings(paths),
    }
}

fn tool(name: &str, tool_type: &str, paths: &[&str]) -> ToolProbeConfig {
    ToolProbeConfig {
        name: name.to_string(),
        tool_type: tool_type.to_string(),
        paths: strings(paths),
    }
}

fn probe(name: &str, path: &str) -> ConfigProbeConfig {
    ConfigProbeConfig {
        name: name.to_string(),
        path: path.to_string(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backup_dir: "~/AppData/Local/dev-env-cleanup-backup".to_string(),
            fingerprint: FingerprintMode::Content,
            marker: DEFAULT_MARKER.to_string(),
            categories: vec![
                category(
                    "powerShellProfiles",
                    &[
                        "~/Documents/WindowsPowerShell/Microsoft.PowerShell_profile.ps1",
                        "~/Documents/PowerShell/Microsoft.PowerShell_profile.ps1",
                        "~/Documents/WindowsPowerShell/profile.ps1",
                        "~/Documents/PowerShell/profile.ps1",
                        r"C:\Windows\System32\WindowsPowerShell\v1.0\profile.ps1",
                    ],
                ),
                category(
                    "gitConfigs",
                    &[
                        "~/.gitconfig",
                        "~/.git-credentials",
                        "~/AppData/Local/Git/config",
                        "~/Projects/.gitconfig",
                    ],
                ),
                category(
                    "vsCodeSettings",
                    &[
                        "~/AppData/Roaming/Code/User/settings.json",
                        "~/AppData/Roaming/Code - Insiders/User/settings.json",
                        "~/Projects/settings.json",
                        "~/.vscode/settings.json",
                    ],
                ),
                category(
                    "sshConfigs",
                    &[
                        "~/.ssh/config",
                        "~/AppData/Roaming/ssh/config",
                        "~/Documents/ssh_config",
                    ],
                ),
                category(
                    "nodeConfigs",
                    &[
                        "~/.npmrc",
                        "~/AppData/Roaming/npm/.npmrc",
                        "~/Projects/.npmrc",
                        "~/.yarnrc",
                        "~/.nvmrc",
                    ],
                ),
                category(
                    "terminalConfigs",
                    &[
                        "~/AppData/Local/Packages/Microsoft.WindowsTerminal_8wekyb3d8bbwe/LocalState/settings.json",
                        "~/AppData/Local/Microsoft/Windows Terminal/settings.json",
                        "~/AppData/Roaming/Microsoft/Windows Terminal/settings.json",
                    ],
                ),
                category(
                    "envScripts",
                    &[
                        "~/.env",
                        "~/Projects/.env",
                        "~/environment.ps1",
                        "~/Documents/environment.ps1",
                    ],
                ),
            ],
            sweep_paths: strings(&[
                "~/AppData/Local/Temp/npm-*",
                "~/AppData/Local/Temp/yarn-*",
                "~/AppData/Local/Temp/vscode-*",
                "~/AppData/Local/Temp/electron-*",
                "~/.npm/_cacache",
                "~/.yarn/cache",
                "~/AppData/Roaming/Code/logs",
                "~/AppData/Roaming/Code/CachedExtensions",
            ]),
            tool_probes: vec![
                tool("Git", "git", &[r"C:\Program Files\Git", r"C:\Program Files (x86)\Git"]),
                tool(
                    "Node.js",
                    "nodejs",
                    &[r"C:\Program Files\nodejs", r"C:\Program Files (x86)\nodejs"],
                ),
                tool(
                    "Python",
                    "python",
                    &[
                        r"C:\Python*",
                        r"C:\Program Files\Python*",
                        "~/AppData/Local/Programs/Python",
                    ],
                ),
                tool(
                    "VS Code",
                    "vscode",
                    &[
                        r"C:\Program Files\Microsoft VS Code",
                        r"C:\Program Files (x86)\Microsoft VS Code",
                        "~/AppData/Local/Programs/Microsoft VS Code",
                    ],
                ),
                tool("Docker Desktop", "docker", &[r"C:\Program Files\Docker\Docker"]),
                tool("Docker CLI", "docker-cli", &[r"C:\ProgramData\DockerDesktop"]),
                tool(
                    "Windows Terminal",
                    "terminal",
                    &["~/AppData/Local/Microsoft/WindowsApps/wt.exe"],
                ),
                tool(
                    "PowerShell Core",
                    "powershell",
                    &[r"C:\Program Files\PowerShell", r"C:\Program Files (x86)\PowerShell"],
                ),
                tool(
                    "Java JDK",
                    "java",
                    &[r"C:\Program Files\Java", r"C:\Program Files (x86)\Java"],
                ),
                tool(
                    "Maven",
                    "maven",
                    &[r"C:\Program Files\Apache\Maven", r"C:\apache-maven*"],
                ),
                tool("Gradle", "gradle", &[r"C:\Gradle", "~/.gradle"]),
                tool("Go", "go", &[r"C:\Program Files\Go", r"C:\Go"]),
                tool("Rust", "rust", &["~/.cargo", "~/.rustup"]),
            ],
            project_roots: strings(&[
                "~/Projects",
                "~/Documents/Projects",
                "~/Desktop/Projects",
                "~/Code",
                "~/Documents/Code",
                "~/Development",
                "~/Dev",
                "~/Workspace",
                "~/Source",
                r"C:\Projects",
                r"C:\Code",
                r"C:\Development",
                r"D:\Projects",
                r"D:\Code",
                r"D:\Development",
            ]),
            config_probes: vec![
                probe(
                    "PowerShell Profile",
                    "~/Documents/WindowsPowerShell/Microsoft.PowerShell_profile.ps1",
                ),
                probe("Git Config", "~/.gitconfig"),
                probe("Git Credentials", "~/.git-credentials"),
                probe("SSH Config", "~/.ssh/config"),
                probe("SSH Keys", "~/.ssh"),
                probe("NPM Config", "~/.npmrc"),
                probe("VS Code Settings", "~/AppData/Roaming/Code/User/settings.json"),
                probe(
                    "VS Code Keybindings",
                    "~/AppData/Roaming/Code/User/keybindings.json",
                ),
                probe(
                    "Windows Terminal Settings",
                    "~/AppData/Local/Packages/Microsoft.WindowsTerminal_8wekyb3d8bbwe/LocalState/settings.json",
                ),
                probe("Environment Variables", "~/.env"),
                probe("Bash Profile", "~/.bash_profile"),
                probe("Bashrc", "~/.bashrc"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_home_relative() {
        let home = Path::new("/home/dev");
        assert_eq!(
            expand_path("~/.ssh/config", home),
            PathBuf::from("/home/dev/.ssh/config")
        );
        assert_eq!(
            expand_path(r"~\Documents\ssh_config", home),
            PathBuf::from("/home/dev/Documents/ssh_config")
        );
        assert_eq!(expand_path("~", home), PathBuf::from("/home/dev"));
        assert_eq!(expand_path("/etc/profile", home), PathBuf::from("/etc/profile"));
        // Only a bare leading tilde means home.
        assert_eq!(expand_path("~other/x", home), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let dirs = vec![
            PathBuf::from("/home/user/docs"),
            PathBuf::from("/home/user"),
            PathBuf::from("/var/data"),
            PathBuf::from("/home/user/docs/deeper"),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(
            result,
            vec![PathBuf::from("/home/user"), PathBuf::from("/var/data")]
        );
    }

    #[test]
    fn test_non_overlapping_no_overlap() {
        let dirs = vec![
            PathBuf::from("/home/user/photos"),
            PathBuf::from("/home/user/docs"),
        ];
        assert_eq!(non_overlapping_directories(dirs.clone()), dirs);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = load_from_toml(
            r#"
            backup_dir = "/srv/backups"
            fingerprint = "signature"
            sweep_paths = ["/tmp/npm-*"]

            [[categories]]
            name = "shell"
            paths = ["~/.bashrc", "~/.bash_profile"]
            "#,
        )
        .unwrap();

        assert_eq!(config.backup_dir, "/srv/backups");
        assert_eq!(config.fingerprint, FingerprintMode::Signature);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.tool_probes, AppConfig::default().tool_probes);

        let resolved = config.resolve(Path::new("/home/dev"));
        assert_eq!(resolved.backup_base, PathBuf::from("/srv/backups"));
        assert_eq!(
            resolved.categories[0].candidates,
            vec![
                PathBuf::from("/home/dev/.bashrc"),
                PathBuf::from("/home/dev/.bash_profile")
            ]
        );
        assert_eq!(
            resolved.sweep_patterns,
            vec![SweepPattern::Prefix {
                base_dir: PathBuf::from("/tmp"),
                prefix: "npm-".to_string()
            }]
        );
        assert_eq!(resolved.fingerprinter.mode(), FingerprintMode::Signature);
    }

    #[test]
    fn test_default_tables_cover_every_category() {
        let config = AppConfig::default();
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "powerShellProfiles",
                "gitConfigs",
                "vsCodeSettings",
                "sshConfigs",
                "nodeConfigs",
                "terminalConfigs",
                "envScripts"
            ]
        );
        assert_eq!(config.sweep_paths.len(), 8);
    }
}
