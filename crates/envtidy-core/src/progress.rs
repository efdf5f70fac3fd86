use std::sync::Mutex;

/// The long-running stages a reporter may want to visualise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dedupe,
    Sweep,
    Migrate,
    Discover,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Dedupe => "Scanning for duplicate configuration files",
            Phase::Sweep => "Cleaning temporary files and caches",
            Phase::Migrate => "Migrating selected items",
            Phase::Discover => "Scanning for existing tools and projects",
        }
    }
}

/// Trait for reporting cleanup and migration progress.
///
/// The CLI implements it with tracing/indicatif; tests collect lines.
/// All methods have default no-op implementations and nothing in the core
/// looks at what a reporter does with a line.
pub trait ProgressReporter: Send + Sync {
    fn on_line(&self, _line: &str) {}
    fn on_phase_start(&self, _phase: Phase) {}
    fn on_phase_complete(&self, _phase: Phase, _items: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Keeps every reported line in memory.
#[derive(Default)]
pub struct CollectingReporter {
    lines: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressReporter for CollectingReporter {
    fn on_line(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut guard) => guard.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}
