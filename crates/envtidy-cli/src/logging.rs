use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/envtidy.log";

/// Where and how much to log. Read from `TRACING_LEVEL`, `LOG_FILE_PATH`
/// and `NO_COLOR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub log_file: PathBuf,
    pub ansi: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok(), std::io::stderr().is_terminal())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, terminal: bool) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            filter: non_empty("TRACING_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_file: PathBuf::from(
                non_empty("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            ),
            ansi: terminal && lookup("NO_COLOR").is_none(),
        }
    }

    /// Split the log file into the appender's directory and file name.
    fn appender_parts(&self) -> (PathBuf, PathBuf) {
        let dir = match self.log_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file = self
            .log_file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("envtidy.log"));
        (dir, file)
    }
}

/// Console output goes to stderr so `--json` output on stdout stays parseable.
/// The returned guard flushes the file writer when dropped.
pub fn init_logger(settings: &LogSettings) -> WorkerGuard {
    let (dir, file) = settings.appender_parts();
    let file_appender = tracing_appender::rolling::never(dir, file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(settings.ansi),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(EnvFilter::new(&settings.filter))
        .init();

    info!(
        "Logging at '{}' to {}",
        settings.filter,
        settings.log_file.display()
    );

    guard
}
