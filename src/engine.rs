//! Reconciliation engine
//!
//! Establishes the startup baseline between the folder and the remote
//! node, then classifies each incoming filesystem event and issues the
//! matching upload/delete calls. All state (checksum index, watch
//! subscriptions) is owned here and mutated from the single consumer
//! task only.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::checksum::{checksum_file, ChecksumIndex};
use crate::client::RenterClient;
use crate::error::{Result, SyncError};
use crate::watcher::{EventReceiver, FolderWatcher, WatchEvent, WatchEventKind};

/// Engine state for one synchronized folder.
pub struct SyncEngine<C> {
    root: PathBuf,
    client: C,
    watcher: FolderWatcher,
    index: ChecksumIndex,
}

impl<C: RenterClient> SyncEngine<C> {
    /// Build an engine for `path` and run the baseline sync.
    ///
    /// On success every regular file under `path` exists on the node and
    /// has a digest recorded, every directory is subscribed, and the
    /// returned receiver carries live events for [`handle_event`].
    /// Any failure here is fatal: nothing is watched and no state leaks.
    ///
    /// [`handle_event`]: SyncEngine::handle_event
    pub async fn new(path: &Path, client: C) -> Result<(Self, EventReceiver)> {
        let root = path.canonicalize()?;

        if client.active_contract_count().await? == 0 {
            return Err(SyncError::NoContracts);
        }

        let (mut watcher, events) = FolderWatcher::new()?;
        watcher.watch(&root)?;

        let mut engine = Self {
            root,
            client,
            watcher,
            index: ChecksumIndex::new(),
        };
        engine.baseline().await?;

        Ok((engine, events))
    }

    /// Walk the folder, diff it against the remote inventory, upload
    /// whatever the node is missing, and seed the checksum index.
    async fn baseline(&mut self) -> Result<()> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if entry.path() == self.root {
                continue;
            }
            if entry.file_type().is_dir() {
                self.watcher.watch(entry.path())?;
            } else if entry.file_type().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }

        let remote: HashSet<String> = self.client.list_files().await?.into_iter().collect();

        for path in &files {
            let rel = relative_path(&self.root, path)?;
            if !remote.contains(&rel) {
                tracing::info!("uploading {}, not present on the node", rel);
                if let Err(err) = self.client.upload(&rel, path).await {
                    tracing::warn!("baseline upload of {} failed: {}", rel, err);
                }
            }
        }

        // Every file gets a baseline digest, uploaded or not; later
        // write events are judged against it.
        for path in files {
            let digest = checksum_file(&path)?;
            self.index.insert(path, digest);
        }

        tracing::debug!(
            "baseline complete: {} files tracked, {} directories watched",
            self.index.len(),
            self.watcher.watched_count()
        );
        Ok(())
    }

    /// Classify one filesystem event and reconcile it with the node.
    ///
    /// Errors returned here are per-path failures; the caller logs them
    /// and keeps consuming events.
    pub async fn handle_event(&mut self, event: WatchEvent) -> Result<()> {
        // Directories never produce a remote artifact; they only extend
        // the subscription set so events inside them are seen.
        if event.is_dir {
            return self.watcher.watch(&event.path);
        }

        match event.kind {
            WatchEventKind::Write => self.handle_write(&event.path).await,
            WatchEventKind::Create => {
                tracing::info!("file creation detected, uploading {}", event.path.display());
                self.handle_create(&event.path).await
            }
            WatchEventKind::Remove => self.handle_remove(&event.path).await,
        }
    }

    /// A write to an untracked path is treated as a create.
    async fn handle_write(&mut self, path: &Path) -> Result<()> {
        let digest = checksum_file(path)?;
        match self.index.get(path) {
            None => self.handle_create(path).await,
            Some(old) if *old != digest => {
                let rel = relative_path(&self.root, path)?;
                tracing::info!("change in {} detected, reuploading", rel);
                // No partial update on the node: full delete + re-upload,
                // index updated only once both calls have completed.
                self.client.delete(&rel).await?;
                self.client.upload(&rel, path).await?;
                self.index.insert(path.to_path_buf(), digest);
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    async fn handle_create(&mut self, path: &Path) -> Result<()> {
        let rel = relative_path(&self.root, path)?;
        self.client.upload(&rel, path).await?;
        let digest = checksum_file(path)?;
        self.index.insert(path.to_path_buf(), digest);
        Ok(())
    }

    async fn handle_remove(&mut self, path: &Path) -> Result<()> {
        if !self.index.contains(path) {
            // Duplicate or already-handled removal.
            return Ok(());
        }
        let rel = relative_path(&self.root, path)?;
        tracing::info!("file removal detected, removing {}", rel);
        self.client.delete(&rel).await?;
        self.index.remove(path);
        Ok(())
    }

    /// The canonicalized folder root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The checksum index, for inspection.
    pub fn index(&self) -> &ChecksumIndex {
        &self.index
    }

    /// Whether a directory is subscribed in the watch adapter.
    pub fn is_watching(&self, dir: &Path) -> bool {
        self.watcher.is_watched(dir)
    }
}

/// Translate an absolute local path into the node's addressing key.
///
/// Independent of the working directory: both `root` and `path` are
/// absolute, and the result is `path` stripped of `root` with `/`
/// separators.
fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| SyncError::OutsideRoot(path.to_path_buf()))?;
    let rel = rel
        .to_str()
        .ok_or_else(|| SyncError::InvalidPath(path.to_path_buf()))?;
    Ok(rel.replace(std::path::MAIN_SEPARATOR, "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_strips_root() {
        let root = Path::new("/folder");
        assert_eq!(
            relative_path(root, Path::new("/folder/a.txt")).unwrap(),
            "a.txt"
        );
        assert_eq!(
            relative_path(root, Path::new("/folder/sub/b.txt")).unwrap(),
            "sub/b.txt"
        );
    }

    #[test]
    fn test_relative_path_rejects_outside_root() {
        let root = Path::new("/folder");
        let result = relative_path(root, Path::new("/elsewhere/a.txt"));
        assert!(matches!(result, Err(SyncError::OutsideRoot(_))));
    }
}
