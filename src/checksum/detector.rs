// src/checksum/detector.rs

use std::cell::OnceCell;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use blake3::Hasher;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::checksum::record::ChecksumRecord;

/// Change detector scoped to one directory tree.
///
/// The digest covers every file under `root` whose name matches one of the
/// configured extension suffixes and whose path is not under an excluded
/// prefix. It incorporates both the root-relative path and the byte content
/// of each file, so renames and content swaps register as changes, and it is
/// independent of filesystem listing order (matched paths are sorted before
/// being folded into the hash).
///
/// One detector owns one [`ChecksumRecord`]; unrelated tasks that track
/// different trees each construct their own instance.
pub struct Detector {
    root: PathBuf,
    record: ChecksumRecord,
    extensions: Vec<String>,
    exclude: Option<GlobSet>,

    /// Digest of the current tree, computed at most once per process run.
    current: OnceCell<String>,
}

impl Detector {
    /// Construct a detector for `root`, persisting its digest at `record_path`.
    ///
    /// `extensions` must be non-empty (files without a matching suffix are
    /// ignored entirely). `exclusions` are path prefixes relative to `root`;
    /// an excluded directory's subtree is never visited.
    pub fn new<S: AsRef<str>>(
        root: impl Into<PathBuf>,
        record_path: impl Into<PathBuf>,
        extensions: &[S],
        exclusions: &[S],
    ) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(anyhow!("detector root {root:?} is not a readable directory"));
        }
        if extensions.is_empty() {
            return Err(anyhow!(
                "detector for {root:?} needs at least one extension filter"
            ));
        }

        let exclude = build_exclude_set(exclusions)
            .with_context(|| format!("building exclusion set for {root:?}"))?;

        Ok(Self {
            root,
            record: ChecksumRecord::new(record_path.into()),
            extensions: extensions.iter().map(|s| s.as_ref().to_string()).collect(),
            exclude,
            current: OnceCell::new(),
        })
    }

    /// Whether the tracked tree differs from the last persisted digest.
    ///
    /// The tree digest is computed on first call and cached for the rest of
    /// the process run, so repeated queries are cheap and consistent. A
    /// missing or unusable record degrades to "no prior digest", which
    /// always reports changed. Read-only; nothing is persisted here.
    pub fn is_changed(&self) -> Result<bool> {
        let current = self.current_digest()?;
        match self.record.load() {
            Some(stored) => Ok(stored != current),
            None => Ok(true),
        }
    }

    /// Persist the current digest to the record file.
    ///
    /// Call only after the gated work has fully succeeded; writing earlier
    /// would let a later run skip work that never completed.
    pub fn write_checksum(&self) -> Result<()> {
        let digest = self.current_digest()?.to_string();
        self.record.store(&digest)
    }

    fn current_digest(&self) -> Result<&str> {
        if let Some(digest) = self.current.get() {
            return Ok(digest);
        }
        let digest = self.compute_digest()?;
        Ok(self.current.get_or_init(|| digest))
    }

    /// Walk the tree, collect matching files, and fold them into one digest.
    ///
    /// Any unreadable file or directory is a hard error: with a partial view
    /// of the tree the caller cannot safely decide changed vs unchanged.
    fn compute_digest(&self) -> Result<String> {
        let mut matched = Vec::new();
        self.collect_files(&self.root, &mut matched)?;

        // Sort by relative path so the digest is stable no matter what order
        // the directory entries came back in.
        matched.sort();

        let mut hasher = Hasher::new();
        for rel in &matched {
            debug!(path = %rel, "hashing file");
            hasher.update(rel.as_bytes());
            hasher.update(&[0]);
            hash_file_contents(&self.root.join(rel), &mut hasher)?;
            hasher.update(&[0]);
        }

        let digest = hasher.finalize().to_hex().to_string();
        debug!(
            root = ?self.root,
            files = matched.len(),
            digest = %digest,
            "computed tree digest"
        );
        Ok(digest)
    }

    fn collect_files(&self, dir: &Path, matched: &mut Vec<String>) -> Result<()> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("reading directory {dir:?}"))?;

        for entry in entries {
            let entry = entry.with_context(|| format!("reading entry in {dir:?}"))?;
            let path = entry.path();

            // The record never participates in its own digest, even when its
            // name happens to match an extension filter.
            if path == self.record.path() {
                continue;
            }

            let rel = self.relative_key(&path)?;

            if let Some(exclude) = &self.exclude
                && exclude.is_match(&rel)
            {
                debug!(path = %rel, "skipping excluded path");
                continue;
            }

            let file_type = entry
                .file_type()
                .with_context(|| format!("inspecting {path:?}"))?;

            if file_type.is_dir() {
                self.collect_files(&path, matched)?;
            } else if file_type.is_file() && self.matches_extension(&rel) {
                matched.push(rel);
            }
        }

        Ok(())
    }

    fn matches_extension(&self, rel: &str) -> bool {
        self.extensions.iter().any(|ext| rel.ends_with(ext.as_str()))
    }

    /// Root-relative path with `/` separators, so digests and exclusion
    /// matches agree across platforms.
    fn relative_key(&self, path: &Path) -> Result<String> {
        let rel = path
            .strip_prefix(&self.root)
            .with_context(|| format!("path {path:?} escaped root {:?}", self.root))?;

        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }
}

fn hash_file_contents(path: &Path, hasher: &mut Hasher) -> Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {path:?}"))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {path:?}"))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(())
}

/// Compile exclusion path prefixes into a glob set matching both the prefix
/// itself and everything beneath it.
fn build_exclude_set<S: AsRef<str>>(exclusions: &[S]) -> Result<Option<GlobSet>> {
    if exclusions.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for prefix in exclusions {
        let prefix = prefix.as_ref().trim_end_matches('/');
        builder.add(
            Glob::new(prefix).with_context(|| format!("invalid exclusion: {prefix}"))?,
        );
        let subtree = format!("{prefix}/**");
        builder.add(
            Glob::new(&subtree).with_context(|| format!("invalid exclusion: {subtree}"))?,
        );
    }
    Ok(Some(builder.build()?))
}
