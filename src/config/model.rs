// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [build]
/// dir = "cmd/server"
/// cmd = "go build -o ../../bin/server"
/// out_dir = "bin"
/// record = ".checksum"
/// extensions = [".go", ".mod"]
/// exclude = ["pkg/service/wire_gen.go"]
///
/// [generate]
/// dir = "pkg/service"
/// cmd = "wire"
/// record = ".checksum.gen"
/// extensions = [".go"]
/// exclude = ["pkg/service/wire_gen.go"]
///
/// [test]
/// cmd = "go test -short ./... -count=1"
/// all_cmd = "go test ./... -count=1 -timeout=4m -v"
///
/// [tools]
/// "github.com/google/wire/cmd/wire" = "latest"
/// ```
///
/// All paths are relative to the directory containing the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// The checksum-gated build target.
    pub build: BuildSection,

    /// The checksum-gated code-generation target.
    pub generate: GenerateSection,

    /// Test commands for `test` and `test-all`.
    pub test: TestSection,

    /// Tools to install before generation runs: identifier => version.
    #[serde(default)]
    pub tools: BTreeMap<String, String>,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Working directory for the build command.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// The build command itself (compiler invocation).
    pub cmd: String,

    /// Output directory, created before building and removed by `clean`.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Checksum record path for the build's tracked tree.
    #[serde(default = "default_build_record")]
    pub record: String,

    /// Filename suffixes whose files participate in the build digest.
    pub extensions: Vec<String>,

    /// Path prefixes skipped entirely during digest traversal.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[generate]` section.
///
/// Gated independently from the build, with its own record and its own
/// exclusions. Generated output paths must appear in `exclude`, or every
/// generation run would see its own output as a change.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSection {
    /// Working directory for the generation tool.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// The generation command (external tool invocation).
    pub cmd: String,

    /// Checksum record path for the generation input tree.
    #[serde(default = "default_generate_record")]
    pub record: String,

    /// Filename suffixes whose files participate in the generation digest.
    pub extensions: Vec<String>,

    /// Path prefixes skipped entirely, including generated outputs.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[test]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TestSection {
    /// Command for the `test` target (short suite).
    pub cmd: String,

    /// Command for the `test-all` target; falls back to `cmd` if omitted.
    #[serde(default)]
    pub all_cmd: Option<String>,
}

impl TestSection {
    pub fn effective_all_cmd(&self) -> &str {
        self.all_cmd.as_deref().unwrap_or(&self.cmd)
    }
}

fn default_dir() -> String {
    ".".to_string()
}

fn default_out_dir() -> String {
    "bin".to_string()
}

fn default_build_record() -> String {
    ".checksum".to_string()
}

fn default_generate_record() -> String {
    ".checksum.gen".to_string()
}
