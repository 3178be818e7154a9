//! Filesystem watch adapter
//!
//! Wraps a platform watcher and narrows its raw notification stream down
//! to the three event kinds the reconciliation engine understands:
//! create, write, remove. Each watched directory is subscribed
//! individually (non-recursive); the engine extends the subscription set
//! as it discovers new subdirectories.
//!
//! Events cross to the consumer task over an unbounded channel. Watcher
//! transport errors travel the same channel so the consumer can report
//! them without a second receive point.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;

/// Semantic kind of a raw filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Create,
    Write,
    Remove,
}

/// A classified filesystem notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
    /// Whether the path refers to a directory. Derived by stat'ing the
    /// path, so a removed path always reports `false`.
    pub is_dir: bool,
}

/// Receiving half of the watch event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<notify::Result<WatchEvent>>;

/// Filesystem watcher owning the set of subscribed directories.
pub struct FolderWatcher {
    inner: RecommendedWatcher,
    watched: HashSet<PathBuf>,
}

impl FolderWatcher {
    /// Create a watcher and the channel its events are delivered on.
    pub fn new() -> Result<(Self, EventReceiver)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for ev in translate(event) {
                    // The receiver only closes on shutdown.
                    let _ = tx.send(Ok(ev));
                }
            }
            Err(err) => {
                let _ = tx.send(Err(err));
            }
        })?;

        Ok((
            Self {
                inner,
                watched: HashSet::new(),
            },
            rx,
        ))
    }

    /// Subscribe a directory. Idempotent; the subscription set only grows.
    pub fn watch(&mut self, dir: &Path) -> Result<()> {
        if self.watched.contains(dir) {
            return Ok(());
        }
        self.inner.watch(dir, RecursiveMode::NonRecursive)?;
        self.watched.insert(dir.to_path_buf());
        Ok(())
    }

    /// Whether a directory is currently subscribed.
    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    /// Number of subscribed directories.
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }
}

/// Map a raw notification to zero or more classified events.
///
/// Renames become remove/create pairs so editors that save through a
/// temporary file and rename over the target still reconcile correctly.
/// Metadata-only and access notifications carry no content change and
/// are dropped.
fn translate(event: Event) -> Vec<WatchEvent> {
    match event.kind {
        EventKind::Create(_) => classify_paths(event.paths, WatchEventKind::Create),
        EventKind::Remove(_) => classify_paths(event.paths, WatchEventKind::Remove),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => classify_paths(event.paths, WatchEventKind::Remove),
            RenameMode::To => classify_paths(event.paths, WatchEventKind::Create),
            RenameMode::Both => {
                // paths = [from, to]
                let mut events = Vec::with_capacity(2);
                let mut paths = event.paths.into_iter();
                if let Some(from) = paths.next() {
                    events.extend(classify_paths(vec![from], WatchEventKind::Remove));
                }
                events.extend(classify_paths(paths.collect(), WatchEventKind::Create));
                events
            }
            // Unpaired rename halves: the side that still exists was
            // created, the side that is gone was removed.
            _ => event
                .paths
                .into_iter()
                .map(|path| {
                    let kind = if path.exists() {
                        WatchEventKind::Create
                    } else {
                        WatchEventKind::Remove
                    };
                    classified(path, kind)
                })
                .collect(),
        },
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            classify_paths(event.paths, WatchEventKind::Write)
        }
        // Metadata changes, access notifications, catch-all kinds.
        _ => Vec::new(),
    }
}

fn classify_paths(paths: Vec<PathBuf>, kind: WatchEventKind) -> Vec<WatchEvent> {
    paths.into_iter().map(|path| classified(path, kind)).collect()
}

fn classified(path: PathBuf, kind: WatchEventKind) -> WatchEvent {
    let is_dir = fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
    WatchEvent { path, kind, is_dir }
}
