// src/tools.rs

//! External tool installation, consumed by generation-related tasks.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::exec;

/// Idempotent ensure-installed-at-version operation.
///
/// Calling `ensure_installed` when the tool is already satisfied is a no-op
/// unless `force` is set, in which case it reinstalls.
pub trait ToolInstaller {
    fn ensure_installed(&self, tool: &str, version: &str, force: bool) -> Result<()>;
}

/// Installer for Go-module tools: probes `PATH` for the tool binary and runs
/// `go install <tool>@<version>` when missing or forced.
#[derive(Debug, Default)]
pub struct GoToolInstaller;

impl GoToolInstaller {
    pub fn new() -> Self {
        Self
    }
}

impl ToolInstaller for GoToolInstaller {
    fn ensure_installed(&self, tool: &str, version: &str, force: bool) -> Result<()> {
        if !force && find_on_path(binary_name(tool)).is_some() {
            debug!(tool = %tool, "tool already installed; skipping");
            return Ok(());
        }

        info!(tool = %tool, version = %version, "installing tool");
        exec::run(&format!("go install {tool}@{version}"))
            .with_context(|| format!("installing {tool}@{version}"))
    }
}

/// Install every tool in the map.
///
/// Iteration order is not significant; the only contract is that all
/// installs complete, or the first failure aborts the remaining ones.
pub fn install_all(
    installer: &dyn ToolInstaller,
    tools: &BTreeMap<String, String>,
    force: bool,
) -> Result<()> {
    for (tool, version) in tools {
        installer.ensure_installed(tool, version, force)?;
    }
    Ok(())
}

/// The binary a tool identifier installs as: its last path segment.
fn binary_name(tool: &str) -> &str {
    tool.rsplit('/').next().unwrap_or(tool)
}

fn find_on_path(binary: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(binary);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
