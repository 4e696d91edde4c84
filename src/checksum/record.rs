// src/checksum/record.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// On-disk persisted form of a tree digest: a single file holding one
/// lowercase-hex blake3 digest (64 chars) plus a trailing newline.
///
/// The record is read when a detector first compares digests and overwritten
/// wholesale after the gated work succeeds. Absence is not an error; a record
/// that does not parse is treated the same as an absent one, so the worst
/// outcome of a damaged record is a redundant rebuild.
#[derive(Debug, Clone)]
pub struct ChecksumRecord {
    path: PathBuf,
}

impl ChecksumRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previously stored digest, if a usable one exists.
    ///
    /// Returns `None` when the record file is absent, unreadable, or does not
    /// contain a plausible digest. None of these are fatal: the caller falls
    /// back to "no prior digest", which reports the tree as changed.
    pub fn load(&self) -> Option<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "no checksum record present");
                return None;
            }
            Err(err) => {
                warn!(
                    path = ?self.path,
                    error = %err,
                    "checksum record unreadable; treating as absent"
                );
                return None;
            }
        };

        let digest = raw.trim();
        if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(digest.to_ascii_lowercase())
        } else {
            warn!(
                path = ?self.path,
                "checksum record is corrupt; treating as absent"
            );
            None
        }
    }

    /// Persist a digest, creating parent directories as needed.
    ///
    /// A write failure here is fatal to the caller: the next run will simply
    /// see the tree as changed again.
    pub fn store(&self, digest: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating checksum record directory {parent:?}"))?;
        }

        fs::write(&self.path, format!("{digest}\n"))
            .with_context(|| format!("writing checksum record {:?}", self.path))?;

        info!(path = ?self.path, digest = %digest, "stored checksum record");
        Ok(())
    }
}
