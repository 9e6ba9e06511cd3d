//! Fire-and-forget persistence
//!
//! A one-way job channel between the synchronous review session and the
//! async `ItemStore`. The session dispatches jobs and moves on; a
//! background worker drains the channel, awaits the store, and reports
//! failures to an injected error sink. Session state never waits for or
//! rolls back on persistence outcomes.
//!
//! Jobs are dispatched in rating order but may complete out of order,
//! which is why `ItemStore` writes must be idempotent per item.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{Rating, ReviewState};
use crate::storage::{ItemStore, StoreError};

/// One outbound persistence request
#[derive(Debug, Clone)]
pub enum PersistJob {
    /// Record a rating and update the item's scheduling state
    Rating {
        item_id: Uuid,
        rating: Rating,
        new_state: ReviewState,
    },
    /// Overwrite an item's state with a prior snapshot (session undo)
    Restore {
        item_id: Uuid,
        prior_state: ReviewState,
    },
    /// Remove an item entirely
    Delete { item_id: Uuid },
}

impl PersistJob {
    fn item_id(&self) -> Uuid {
        match self {
            PersistJob::Rating { item_id, .. }
            | PersistJob::Restore { item_id, .. }
            | PersistJob::Delete { item_id } => *item_id,
        }
    }
}

/// Callback invoked with every persistence failure
pub type ErrorSink = Arc<dyn Fn(StoreError) + Send + Sync>;

/// Cheap handle for dispatching persistence jobs.
///
/// Dispatch never blocks and never fails the caller: if the worker is gone
/// the job is dropped with a warning.
#[derive(Clone)]
pub struct PersistHandle {
    sender: Option<mpsc::UnboundedSender<PersistJob>>,
}

impl PersistHandle {
    /// A handle that silently discards every job. For sessions that run
    /// without a store.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn dispatch(&self, job: PersistJob) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(job).is_err() {
            log::warn!("persistence worker is gone, dropping job");
        }
    }
}

/// Start the background persistence worker.
///
/// Returns the dispatch handle and the worker's join handle. The worker
/// exits once every `PersistHandle` clone has been dropped and the channel
/// is drained; in-flight jobs are not cancelled.
pub fn spawn_persist_worker(
    store: Arc<dyn ItemStore>,
    error_sink: Option<ErrorSink>,
) -> (PersistHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<PersistJob>();

    let worker = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let item_id = job.item_id();
            let result = match job {
                PersistJob::Rating {
                    item_id,
                    rating,
                    new_state,
                } => store
                    .persist_rating(item_id, rating, new_state)
                    .await
                    .map(|_| ()),
                PersistJob::Restore {
                    item_id,
                    prior_state,
                } => store.restore_state(item_id, prior_state).await.map(|_| ()),
                PersistJob::Delete { item_id } => store.delete_item(item_id).await,
            };

            if let Err(error) = result {
                log::error!("persistence failed for item {}: {}", item_id, error);
                if let Some(sink) = &error_sink {
                    sink(error);
                }
            }
        }
        log::info!("persistence worker shut down");
    });

    (PersistHandle { sender: Some(tx) }, worker)
}
