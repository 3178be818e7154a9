//! Folder lifecycle
//!
//! [`SyncFolder`] owns the consumer task that drains the watch event
//! channel. Exactly one task touches the engine, serializing every
//! index mutation and remote call without locking; a slow remote call
//! delays later events rather than running them concurrently.

use std::path::Path;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::client::RenterClient;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::watcher::EventReceiver;

/// A folder being synchronized to the remote node.
pub struct SyncFolder {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncFolder {
    /// Run the baseline sync for `path`, then start consuming events.
    ///
    /// Returns once the baseline is complete and watching has begun; any
    /// baseline failure aborts before anything is watched.
    pub async fn start<C>(path: &Path, client: C) -> Result<Self>
    where
        C: RenterClient + 'static,
    {
        let (engine, events) = SyncEngine::new(path, client).await?;
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_loop(engine, events, stop_rx));
        Ok(Self { stop, task })
    }

    /// Stop the consumer task and release the watch subscription.
    ///
    /// The stop signal is observed before the next event, never
    /// mid-operation: an in-flight remote call completes first. When
    /// this returns the task has exited and the watcher is dropped.
    /// Taking `self` by value makes a second close a compile error.
    pub async fn close(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}

async fn run_loop<C: RenterClient>(
    mut engine: SyncEngine<C>,
    mut events: EventReceiver,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            // Shutdown wins over a ready event.
            biased;

            _ = &mut stop => break,

            received = events.recv() => match received {
                Some(Ok(event)) => {
                    if let Err(err) = engine.handle_event(event).await {
                        // Per-path failure; the next event for this path
                        // will reconcile it.
                        tracing::error!("{}", err);
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!("watch transport error: {}", err);
                }
                None => break,
            },
        }
    }
    tracing::debug!("event loop for {} stopped", engine.root().display());
}
