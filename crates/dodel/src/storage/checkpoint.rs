//! Periodic snapshot checkpoints for long-running hosts.
//!
//! A [`Checkpointer`] saves a shared store on a fixed interval in a
//! background task. Failed checkpoints are logged and retried on the next
//! tick; they never stop the task. [`Checkpointer::shutdown`] stops the task
//! and performs one final save whose result is returned to the caller.

use super::PostStore;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Background task that saves a store every `interval`.
///
/// # Example
///
/// ```no_run
/// use dodel::storage::{Checkpointer, StoreBackend, StoreOptions, create_store};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> anyhow::Result<()> {
///     let store = create_store(
///         StoreBackend::Snapshot(".dodel/snapshot.json".into()),
///         StoreOptions::default(),
///     )
///     .await?;
///     let store: Arc<dyn dodel::storage::PostStore> = Arc::from(store);
///
///     let checkpointer = Checkpointer::spawn(Arc::clone(&store), Duration::from_secs(60));
///     // ... serve requests with `store` ...
///     checkpointer.shutdown_on_ctrl_c().await?;
///     Ok(())
/// }
/// ```
pub struct Checkpointer {
    store: Arc<dyn PostStore>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Checkpointer {
    /// Start checkpointing `store` every `interval`.
    ///
    /// The first checkpoint happens one full interval after spawning.
    pub fn spawn(store: Arc<dyn PostStore>, interval: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let task_store = Arc::clone(&store);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => checkpoint(task_store.as_ref()).await,
                    _ = stopped.changed() => break,
                }
            }
            debug!("Checkpoint task stopped");
        });

        info!(interval_secs = interval.as_secs_f64(), "Started periodic checkpoints");
        Self { store, stop, task }
    }

    /// Stop the background task and save one last time.
    ///
    /// # Errors
    ///
    /// Returns the final save's error. Earlier periodic failures were only
    /// logged.
    pub async fn shutdown(self) -> Result<()> {
        // The receiver is gone only if the task already ended
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Checkpoint task ended abnormally");
        }

        self.store.save().await?;
        info!("Final snapshot saved");
        Ok(())
    }

    /// Wait for Ctrl-C, then [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Returns an IO error if the signal handler cannot be installed, or the
    /// final save's error.
    pub async fn shutdown_on_ctrl_c(self) -> Result<()> {
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        self.shutdown().await
    }
}

/// One best-effort save.
async fn checkpoint(store: &dyn PostStore) {
    match store.save().await {
        Ok(()) => debug!("Checkpoint saved"),
        Err(e) => warn!(error = %e, "Checkpoint failed, will retry on next interval"),
    }
}
