// src/checksum/mod.rs

//! Content-checksum change detection for tracked file trees.
//!
//! A [`Detector`] computes a deterministic blake3 digest over every file
//! under a root directory that matches an extension filter and is not under
//! an excluded path, and compares it against the digest persisted by the
//! previous successful run.

pub mod detector;
pub mod record;

pub use detector::Detector;
pub use record::ChecksumRecord;
