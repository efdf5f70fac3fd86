mod commands;
mod logging;
mod progress;

use std::fs;
use std::path::Path;
use std::process;
use std::time::Instant;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use envtidy_core::cleanup::format_megabytes;
use envtidy_core::config::{self, AppConfig, ResolvedConfig};
use envtidy_core::discovery::{self, ScanReport};
use envtidy_core::{
    CleanupEngine, MigrationExecutor, MigrationPlan, Phase, ProgressReporter,
};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger(&logging::LogSettings::from_env());

    let args = Cli::parse();

    let loaded = match &args.config {
        Some(path) => config::load_from_path(path),
        None => config::load_configuration(),
    };
    let app_config = match loaded {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Cleanup { json }) => run_cleanup(&app_config, json),
        Some(Commands::Scan { json }) => run_scan(&app_config, json),
        Some(Commands::Migrate {
            target,
            plan,
            no_backup,
            no_merge,
        }) => run_migrate(&app_config, &target, plan.as_deref(), !no_backup, !no_merge),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", app_config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn resolve(app_config: &AppConfig) -> anyhow::Result<ResolvedConfig> {
    let home = config::home_dir()?;
    Ok(app_config.resolve(&home))
}

fn run_cleanup(app_config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let resolved = resolve(app_config)?;
    let engine = CleanupEngine::new(
        resolved.categories,
        resolved.sweep_patterns,
        resolved.backup_base,
    )
    .with_fingerprinter(resolved.fingerprinter);

    let reporter = CliReporter::new();
    let result = engine.run(&reporter);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    for line in &result.cleaned {
        info!("{}", line.cyan());
    }
    info!(
        "{} files removed ({} temporary), {} MB freed",
        format!("{}", result.files_removed).red(),
        format!("{}", result.temp_files_removed).red(),
        format_megabytes(result.space_freed_bytes).green(),
    );
    if let Some(root) = &result.backup_root {
        info!("Backups kept in {}", root.display());
    }
    for issue in &result.issues {
        warn!("{}", issue.yellow());
    }
    println!("{}", result.summary.bold());

    Ok(())
}

fn scan_machine(resolved: &ResolvedConfig, reporter: &dyn ProgressReporter) -> ScanReport {
    reporter.on_phase_start(Phase::Discover);
    let start = Instant::now();
    let report = discovery::scan(
        &resolved.tool_probes,
        &resolved.project_roots,
        &resolved.config_probes,
    );
    reporter.on_phase_complete(
        Phase::Discover,
        report.tools.len() + report.project_directories.len() + report.configuration_files.len(),
        start.elapsed().as_secs_f64(),
    );
    report
}

fn run_scan(app_config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let resolved = resolve(app_config)?;
    let report = scan_machine(&resolved, &CliReporter::new());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Tools".bold());
    for tool in &report.tools {
        println!(
            "  {} [{}] {} ({} MB)",
            tool.name.green(),
            tool.tool_type,
            tool.path.display(),
            format_megabytes(tool.size)
        );
    }
    println!("{}", "Project directories".bold());
    for group in &report.project_directories {
        println!(
            "  {}: {} project(s), {} MB",
            group.path.display().to_string().green(),
            group.project_count,
            format_megabytes(group.size)
        );
        for project in &group.projects {
            println!("    {} ({})", project.name, project.project_type.cyan());
        }
    }
    println!("{}", "Configuration files".bold());
    for config in &report.configuration_files {
        println!("  {} {}", config.name.green(), config.path.display());
    }

    Ok(())
}

fn run_migrate(
    app_config: &AppConfig,
    target: &Path,
    plan_path: Option<&Path>,
    create_backup: bool,
    merge_existing: bool,
) -> anyhow::Result<()> {
    let reporter = CliReporter::new();

    let plan = match plan_path {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("reading migration plan {}", path.display()))?;
            let mut plan: MigrationPlan = serde_json::from_str(&data)
                .with_context(|| format!("parsing migration plan {}", path.display()))?;
            plan.target_directory = target.to_path_buf();
            plan.create_backup &= create_backup;
            plan.merge_existing &= merge_existing;
            plan
        }
        None => {
            let resolved = resolve(app_config)?;
            let report = scan_machine(&resolved, &reporter);
            MigrationPlan::new(target)
                .with_items(report.into_items())
                .with_backup(create_backup)
                .with_merge(merge_existing)
        }
    };

    let result = MigrationExecutor::new(plan).migrate(&reporter);

    println!();
    info!(
        "{} tools, {} project groups, {} configs migrated ({} total)",
        format!("{}", result.migrated_tools.len()).green(),
        format!("{}", result.migrated_projects.len()).green(),
        format!("{}", result.migrated_configs.len()).green(),
        format!("{}", result.total_files_migrated).green(),
    );
    if let Some(backup) = &result.backup_location {
        info!("Backup created at {}", backup.display());
    }
    for err in &result.errors {
        warn!("{}", err.red());
    }

    Ok(())
}
