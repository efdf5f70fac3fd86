use envtidy_core::{Phase, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI progress reporter: a spinner per phase, status lines printed above it.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar<F: FnOnce(&mut Option<ProgressBar>)>(&self, f: F) {
        match self.bar.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

impl ProgressReporter for CliReporter {
    fn on_line(&self, line: &str) {
        self.with_bar(|bar| match bar.as_ref() {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        });
    }

    fn on_phase_start(&self, phase: Phase) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.set_message(format!("{}...", phase.label()));
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.with_bar(|bar| {
            if let Some(old) = bar.replace(pb) {
                old.finish_and_clear();
            }
        });
    }

    fn on_phase_complete(&self, phase: Phase, items: usize, duration_secs: f64) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.take() {
                pb.finish_and_clear();
            }
        });
        eprintln!(
            "  \x1b[32m✓\x1b[0m {}: {} item(s) in {:.2}s",
            phase.label(),
            items,
            duration_secs
        );
    }
}
