//! siasync - keep a local folder synchronized to a Sia storage node
//!
//! Watches a directory tree for changes and reconciles them against the
//! node's renter API: new and modified files are uploaded, removed files
//! are deleted remotely, and a checksum index suppresses re-uploads of
//! unchanged content.

pub mod checksum;
pub mod client;
pub mod engine;
pub mod error;
pub mod folder;
pub mod watcher;

pub use client::{NodeClient, RenterClient};
pub use error::{Result, SyncError};
pub use folder::SyncFolder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
