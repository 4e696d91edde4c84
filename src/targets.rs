// src/targets.rs

//! Default target set: build, test, test-all, clean, generate, deps.
//!
//! This is where the registry, the detectors, and the tool installer meet.
//! Each target is a closure over its slice of the configuration; the
//! expensive targets (build, generate) are wrapped in the gated pattern from
//! [`run_gated`], each with its own detector and checksum record.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::info;

use crate::checksum::Detector;
use crate::config::ConfigFile;
use crate::exec;
use crate::task::Registry;
use crate::tools::{self, ToolInstaller};

/// Run the gated-task pattern around an expensive action.
///
/// Skips the action entirely when the detector reports the tracked tree
/// unchanged. When the action runs and succeeds, the detector's checksum is
/// persisted; when it fails, the checksum is left untouched so the next run
/// retries.
pub fn run_gated(
    detector: &Detector,
    skip_message: &str,
    expensive: impl FnOnce() -> Result<()>,
) -> Result<()> {
    if !detector.is_changed()? {
        info!("{skip_message}");
        println!("{skip_message}");
        return Ok(());
    }

    expensive()?;
    detector.write_checksum()
}

/// Build the default registry for a project rooted at `root`.
///
/// Both detectors are constructed here, one per tracked tree, and handed to
/// the task closure that owns them; no detector state is shared between
/// unrelated tasks.
pub fn build_registry(
    root: &Path,
    cfg: &ConfigFile,
    installer: Rc<dyn ToolInstaller>,
) -> Result<Registry> {
    let mut registry = Registry::new();

    // deps: explicitly reinstall all tools.
    {
        let installer = installer.clone();
        let tool_versions = cfg.tools.clone();
        registry.task("deps", &[], move || {
            tools::install_all(installer.as_ref(), &tool_versions, true)
        });
    }

    // install-deps: implicit, idempotent install before generation.
    {
        let installer = installer.clone();
        let tool_versions = cfg.tools.clone();
        registry.task("install-deps", &[], move || {
            tools::install_all(installer.as_ref(), &tool_versions, false)
        });
    }

    // generate: checksum-gated code generation. Its input tree excludes the
    // generated outputs, otherwise every run would see its own output as a
    // change.
    {
        let detector = Detector::new(
            root,
            root.join(&cfg.generate.record),
            &cfg.generate.extensions,
            &cfg.generate.exclude,
        )
        .context("constructing generate detector")?;
        let dir = root.join(&cfg.generate.dir);
        let cmd = cfg.generate.cmd.clone();

        registry.task("generate", &["install-deps"], move || {
            run_gated(&detector, "generated code up to date", || {
                println!("generating...");
                exec::run_in_dir(&dir, &cmd)
            })
        });
    }

    // build: checksum-gated compilation, after generation.
    {
        let detector = Detector::new(
            root,
            root.join(&cfg.build.record),
            &cfg.build.extensions,
            &cfg.build.exclude,
        )
        .context("constructing build detector")?;
        let dir = root.join(&cfg.build.dir);
        let cmd = cfg.build.cmd.clone();
        let out_dir = root.join(&cfg.build.out_dir);

        registry.task("build", &["generate"], move || {
            run_gated(&detector, "up to date", || {
                println!("building...");
                fs::create_dir_all(&out_dir)
                    .with_context(|| format!("creating output directory {out_dir:?}"))?;
                exec::run_in_dir(&dir, &cmd)
            })
        });
    }

    // test / test-all: never gated; the test runner decides what to cache.
    {
        let dir = root.to_path_buf();
        let cmd = cfg.test.cmd.clone();
        registry.task("test", &["generate"], move || exec::run_in_dir(&dir, &cmd));
    }
    {
        let dir = root.to_path_buf();
        let cmd = cfg.test.effective_all_cmd().to_string();
        registry.task("test-all", &["generate"], move || {
            exec::run_in_dir(&dir, &cmd)
        });
    }

    // clean: remove build outputs and both checksum records.
    {
        let out_dir = root.join(&cfg.build.out_dir);
        let records: Vec<PathBuf> = vec![
            root.join(&cfg.build.record),
            root.join(&cfg.generate.record),
        ];
        registry.task("clean", &[], move || {
            println!("cleaning...");
            remove_if_exists(&out_dir, true)?;
            for record in &records {
                remove_if_exists(record, false)?;
            }
            Ok(())
        });
    }

    Ok(registry)
}

fn remove_if_exists(path: &Path, is_dir: bool) -> Result<()> {
    let result = if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing {path:?}")),
    }
}
