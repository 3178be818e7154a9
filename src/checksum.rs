//! Content digests and the checksum index
//!
//! The index maps absolute file paths to SHA-256 digests of their
//! contents. It is the engine's record of what has been reconciled with
//! the remote node: an entry exists only for files believed present both
//! on disk and remotely as of the last update. The index is owned and
//! mutated exclusively by the single consumer task, so it carries no
//! interior locking.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest as _, Sha256};

use crate::error::Result;

/// A SHA-256 content digest.
pub type Digest = [u8; 32];

/// Compute the SHA-256 digest of a file on disk.
///
/// Streams the file through the hasher rather than reading it into
/// memory; may block, which is acceptable on the consumer task.
pub fn checksum_file(path: &Path) -> Result<Digest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().into())
}

/// Mapping of absolute file path to content digest.
#[derive(Debug, Default)]
pub struct ChecksumIndex {
    entries: HashMap<PathBuf, Digest>,
}

impl ChecksumIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the last reconciled digest for a path.
    pub fn get(&self, path: &Path) -> Option<&Digest> {
        self.entries.get(path)
    }

    /// Record a path as reconciled with the given digest.
    pub fn insert(&mut self, path: PathBuf, digest: Digest) {
        self.entries.insert(path, digest);
    }

    /// Drop a path from the index. Returns the digest it held, if any.
    pub fn remove(&mut self, path: &Path) -> Option<Digest> {
        self.entries.remove(path)
    }

    /// Whether a path is currently tracked.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
