// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod vcs;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile, ProjectConfig};
use crate::engine::{Supervisor, SupervisorOptions};
use crate::exec::RealCommandRunner;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the real command runner
/// - the supervisor loop (which also handles Ctrl-C)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    info!(
        config = %args.config.display(),
        daemons = cfg.daemon.len(),
        poll_interval = ?cfg.poll_interval,
        "starting supervisor"
    );

    let supervisor = Supervisor::from_config(&cfg, Arc::new(RealCommandRunner))?;
    let options = SupervisorOptions {
        max_iterations: args.max_iterations,
    };
    supervisor.run(options).await?;
    Ok(())
}

/// Dry-run output: settings, projects with their dependencies, daemons.
fn print_dry_run(cfg: &ConfigFile) {
    println!("buildwatch dry-run");
    println!("  config.workspace = {}", cfg.config.workspace.display());
    println!(
        "  config.remote = git@{}:{}/<repository>.git",
        cfg.config.git_host, cfg.config.organization
    );
    println!("  config.poll_interval = {:?}", cfg.poll_interval);
    println!(
        "  config.stop = {} checks every {:?}",
        cfg.stop_policy.max_checks, cfg.stop_policy.poll_interval
    );
    println!();

    if let Some(ref coordinator) = cfg.coordinator {
        println!("coordinator:");
        println!("      executable: {}", coordinator.executable.display());
        if !coordinator.args.is_empty() {
            println!("      args: {:?}", coordinator.args);
        }
        println!();
    }

    println!("projects ({}):", cfg.project.len());
    for (name, project) in cfg.project.iter() {
        print_project(name, project);
    }
    println!();

    println!("daemons ({}):", cfg.daemon.len());
    for (name, daemon) in cfg.daemon.iter() {
        println!("  - {name}");
        println!("      project: {}", daemon.project);
        println!("      executable: {}", daemon.executable.display());
        println!("      restart: {:?}", daemon.restart);
        if !daemon.args.is_empty() {
            println!("      args: {:?}", daemon.args);
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_project(name: &str, project: &ProjectConfig) {
    println!("  - {name}");
    println!("      repository: {} ({})", project.repository, project.branch);
    println!(
        "      build: {:?} {} -j {}",
        project.build_system,
        project.build_type,
        project.effective_jobs()
    );
    if !project.cmake_flags.is_empty() {
        println!("      cmake_flags: {:?}", project.cmake_flags);
    }
    if project.install {
        println!("      install: true");
    }
    if !project.vendored.is_empty() {
        println!("      vendored: {:?}", project.vendored);
    }
    if !project.after.is_empty() {
        println!("      after: {:?}", project.after);
    }
}
