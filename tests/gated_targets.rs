use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::anyhow;
use tempfile::tempdir;

use taskdag::checksum::Detector;
use taskdag::config::load_and_validate;
use taskdag::targets::{build_registry, run_gated};
use taskdag::task::Scheduler;
use taskdag::tools::{install_all, ToolInstaller};

type TestResult = Result<(), Box<dyn Error>>;

const GO: &[&str] = &[".go"];
const NONE: &[&str] = &[];

/// Installer that records calls instead of touching the system.
#[derive(Default)]
struct MockInstaller {
    calls: RefCell<Vec<(String, String, bool)>>,
    fail_on: Option<String>,
}

impl ToolInstaller for MockInstaller {
    fn ensure_installed(&self, tool: &str, version: &str, force: bool) -> anyhow::Result<()> {
        self.calls
            .borrow_mut()
            .push((tool.to_string(), version.to_string(), force));
        if self.fail_on.as_deref() == Some(tool) {
            return Err(anyhow!("install of {tool} failed"));
        }
        Ok(())
    }
}

fn write_config(root: &Path) -> TestResult {
    fs::write(
        root.join("Taskdag.toml"),
        r#"
[build]
cmd = "printf built >> build.count"
out_dir = "bin"
extensions = [".go"]

[generate]
cmd = "printf gen >> gen.count"
record = ".checksum.gen"
extensions = [".go"]
exclude = ["generated"]

[test]
cmd = "true"

[tools]
"example.com/cmd/fakegen" = "v1.2.3"
"#,
    )?;
    Ok(())
}

#[test]
fn gated_action_is_skipped_when_unchanged() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    let record = root.join(".checksum");
    fs::write(root.join("a.go"), "1")?;

    let runs = RefCell::new(0u32);
    let expensive = || {
        *runs.borrow_mut() += 1;
        Ok(())
    };

    let detector = Detector::new(root, &record, GO, NONE)?;
    run_gated(&detector, "up to date", expensive)?;
    assert_eq!(*runs.borrow(), 1);

    // A fresh detector over the same tree sees the stored checksum.
    let detector = Detector::new(root, &record, GO, NONE)?;
    run_gated(&detector, "up to date", expensive)?;
    assert_eq!(*runs.borrow(), 1);

    Ok(())
}

#[test]
fn failed_action_does_not_write_the_checksum() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    let record = root.join(".checksum");
    fs::write(root.join("a.go"), "1")?;

    let detector = Detector::new(root, &record, GO, NONE)?;
    let result = run_gated(&detector, "up to date", || Err(anyhow!("compiler exploded")));
    assert!(result.is_err());
    assert!(!record.exists());

    // The next run still sees the tree as changed and retries.
    let detector = Detector::new(root, &record, GO, NONE)?;
    assert!(detector.is_changed()?);

    Ok(())
}

#[test]
fn build_target_runs_generate_first_and_skips_when_unchanged() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    write_config(root)?;
    fs::write(root.join("a.go"), "1")?;

    let cfg = load_and_validate(root.join("Taskdag.toml"))?;

    let run_build = || -> TestResult {
        let mock = Rc::new(MockInstaller::default());
        let registry = build_registry(root, &cfg, mock.clone())?;
        registry.validate()?;
        Scheduler::new(&registry).run("build")?;
        Ok(())
    };

    // First invocation: generate then build, both record checksums.
    run_build()?;
    assert_eq!(fs::read_to_string(root.join("gen.count"))?, "gen");
    assert_eq!(fs::read_to_string(root.join("build.count"))?, "built");
    assert!(root.join(".checksum").is_file());
    assert!(root.join(".checksum.gen").is_file());
    assert!(root.join("bin").is_dir());

    // Unchanged tree: both gated actions skip.
    run_build()?;
    assert_eq!(fs::read_to_string(root.join("gen.count"))?, "gen");
    assert_eq!(fs::read_to_string(root.join("build.count"))?, "built");

    // A source edit re-runs both.
    fs::write(root.join("a.go"), "2")?;
    run_build()?;
    assert_eq!(fs::read_to_string(root.join("gen.count"))?, "gengen");
    assert_eq!(fs::read_to_string(root.join("build.count"))?, "builtbuilt");

    Ok(())
}

#[test]
fn generate_installs_tools_without_force() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    write_config(root)?;
    fs::write(root.join("a.go"), "1")?;

    let cfg = load_and_validate(root.join("Taskdag.toml"))?;
    let mock = Rc::new(MockInstaller::default());
    let registry = build_registry(root, &cfg, mock.clone())?;

    Scheduler::new(&registry).run("generate")?;

    let calls = mock.calls.borrow();
    assert_eq!(
        &*calls,
        &[(
            "example.com/cmd/fakegen".to_string(),
            "v1.2.3".to_string(),
            false
        )]
    );

    Ok(())
}

#[test]
fn deps_target_forces_reinstall() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    write_config(root)?;
    fs::write(root.join("a.go"), "1")?;

    let cfg = load_and_validate(root.join("Taskdag.toml"))?;
    let mock = Rc::new(MockInstaller::default());
    let registry = build_registry(root, &cfg, mock.clone())?;

    Scheduler::new(&registry).run("deps")?;

    let calls = mock.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].2, "deps must pass force = true");

    Ok(())
}

#[test]
fn clean_removes_outputs_and_records() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    write_config(root)?;
    fs::write(root.join("a.go"), "1")?;

    let cfg = load_and_validate(root.join("Taskdag.toml"))?;
    let mock = Rc::new(MockInstaller::default());
    let registry = build_registry(root, &cfg, mock.clone())?;
    let scheduler = Scheduler::new(&registry);

    scheduler.run("build")?;
    assert!(root.join("bin").is_dir());

    scheduler.run("clean")?;
    assert!(!root.join("bin").exists());
    assert!(!root.join(".checksum").exists());
    assert!(!root.join(".checksum.gen").exists());

    // Clean is idempotent.
    scheduler.run("clean")?;

    Ok(())
}

#[test]
fn install_all_aborts_on_first_failure() -> TestResult {
    let mock = MockInstaller {
        fail_on: Some("example.com/cmd/bad".to_string()),
        ..MockInstaller::default()
    };

    let mut tools = BTreeMap::new();
    tools.insert("example.com/cmd/bad".to_string(), "latest".to_string());
    tools.insert("example.com/cmd/good".to_string(), "latest".to_string());

    assert!(install_all(&mock, &tools, false).is_err());

    // BTreeMap iterates "bad" first; "good" must not have been attempted.
    let calls = mock.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "example.com/cmd/bad");

    Ok(())
}
