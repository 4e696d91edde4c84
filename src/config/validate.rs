// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - `build.cmd`, `generate.cmd` and `test.cmd` are non-empty
/// - `build.extensions` and `generate.extensions` are non-empty (a detector
///   with no extension filter would track nothing and always report
///   unchanged)
/// - build and generate persist their digests to distinct record paths
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_commands(cfg)?;
    validate_extensions(cfg)?;
    validate_records(cfg)?;
    Ok(())
}

fn validate_commands(cfg: &ConfigFile) -> Result<()> {
    for (section, cmd) in [
        ("build", &cfg.build.cmd),
        ("generate", &cfg.generate.cmd),
        ("test", &cfg.test.cmd),
    ] {
        if cmd.trim().is_empty() {
            return Err(anyhow!("[{section}].cmd must not be empty"));
        }
    }
    Ok(())
}

fn validate_extensions(cfg: &ConfigFile) -> Result<()> {
    if cfg.build.extensions.is_empty() {
        return Err(anyhow!(
            "[build].extensions must list at least one filename suffix"
        ));
    }
    if cfg.generate.extensions.is_empty() {
        return Err(anyhow!(
            "[generate].extensions must list at least one filename suffix"
        ));
    }
    Ok(())
}

fn validate_records(cfg: &ConfigFile) -> Result<()> {
    if cfg.build.record == cfg.generate.record {
        return Err(anyhow!(
            "[build].record and [generate].record must be distinct paths (got {:?} for both)",
            cfg.build.record
        ));
    }
    Ok(())
}
