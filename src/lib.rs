// src/lib.rs

pub mod checksum;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod targets;
pub mod task;
pub mod tools;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::task::{Registry, Scheduler};
use crate::tools::GoToolInstaller;

/// Default target when none is given on the command line.
const DEFAULT_TARGET: &str = "build";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - registry construction (detectors, installer, task actions)
/// - scheduler dispatch for the requested target
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);

    let installer = Rc::new(GoToolInstaller::new());
    let registry = targets::build_registry(&root, &cfg, installer)?;
    registry.validate()?;

    if args.list {
        print_targets(&registry);
        return Ok(());
    }

    let target = args.target.as_deref().unwrap_or(DEFAULT_TARGET);
    if !registry.contains(target) {
        let available: Vec<&str> = registry.names().collect();
        return Err(anyhow!(
            "unknown target '{target}'; available targets: {}",
            available.join(", ")
        ));
    }

    debug!(target = %target, root = ?root, "dispatching target");
    let scheduler = Scheduler::new(&registry);
    scheduler.run(target)?;
    Ok(())
}

/// Project root: the directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Print targets and their dependencies, `--list` output.
fn print_targets(registry: &Registry) {
    println!("targets:");
    for task in registry.tasks() {
        if task.deps().is_empty() {
            println!("  - {}", task.name());
        } else {
            println!("  - {} (after: {})", task.name(), task.deps().join(", "));
        }
    }
}
