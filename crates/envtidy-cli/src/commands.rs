use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "envtidy")]
#[command(about = "Deduplicate developer configuration and migrate tools to a new root", long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of ./Config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Remove duplicate configuration files (with backups) and sweep caches
    Cleanup {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look for tools, project folders and configuration files to migrate
    Scan {
        /// Print the scan report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy tools, projects and configs into a new root directory
    Migrate {
        /// Root directory to migrate into
        #[arg(long)]
        target: PathBuf,
        /// JSON migration plan; when absent everything found by `scan` is selected
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Do not snapshot sources into <target>/migration-backup
        #[arg(long)]
        no_backup: bool,
        /// Leave existing destinations untouched
        #[arg(long)]
        no_merge: bool,
    },
    /// Print configuration values
    PrintConfig,
}
