// src/exec.rs

//! Blocking shell command execution for task actions.
//!
//! Task actions delegate their real work (compiler, codegen tool, test
//! runner) to external processes. Each process inherits stdio, runs to
//! completion before the scheduler proceeds, and surfaces its exit status as
//! success or a descriptive failure. Timeouts, if a caller wants them,
//! belong to the command line itself, not to this layer.

use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

/// Run a shell command in the current working directory.
pub fn run(cmdline: &str) -> Result<()> {
    run_in_dir(Path::new("."), cmdline)
}

/// Run a shell command with `dir` as its working directory, blocking until
/// it exits. A non-zero exit status is an error carrying the command line
/// and the status.
pub fn run_in_dir(dir: &Path, cmdline: &str) -> Result<()> {
    info!(cmd = %cmdline, dir = ?dir, "running command");

    let status = shell_command(cmdline)
        .current_dir(dir)
        .status()
        .with_context(|| format!("spawning `{cmdline}` in {dir:?}"))?;

    debug!(cmd = %cmdline, code = ?status.code(), "command exited");

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("`{cmdline}` exited with {status}"))
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmdline: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmdline);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmdline);
        c
    }
}
