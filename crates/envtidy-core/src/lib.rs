pub mod cleanup;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fsops;
pub mod hasher;
pub mod migration;
pub mod progress;

pub use cleanup::{CleanupCategory, CleanupEngine, CleanupResult, SweepPattern};
pub use config::{AppConfig, ResolvedConfig};
pub use error::Error;
pub use hasher::{Fingerprint, FingerprintMode, Fingerprinter};
pub use migration::{MigrationExecutor, MigrationItem, MigrationPlan, MigrationResult};
pub use progress::{CollectingReporter, Phase, ProgressReporter, SilentReporter};
