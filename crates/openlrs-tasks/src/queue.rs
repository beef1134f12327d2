//! The background job queue and its worker.
//!
//! Ingest enqueues work and answers the client without waiting for it.
//! The worker drains the queue and runs every job on its own task, so no
//! ordering exists between jobs; they coordinate only through the stores,
//! and the store semantics (insert-before-enqueue, monotonic voiding)
//! keep that safe.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use openlrs_store::Stores;
use openlrs_types::StatementId;

use crate::config::TasksConfig;
use crate::dispatch::DeliveryClient;
use crate::error::TaskError;
use crate::hooks::run_hook_dispatch;
use crate::resolver::{MetadataResolver, run_metadata_resolution};
use crate::voiding::run_voiding;

/// A unit of background work, queued at ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// A batch of statements was stored; run hook dispatch and metadata
    /// resolution over it.
    StatementsStored {
        /// Ids of the stored batch.
        batch: Vec<StatementId>,
    },
    /// Valid voiding statements named these targets.
    VoidTargets {
        /// Ids to mark as voided.
        targets: Vec<StatementId>,
    },
}

/// Cloneable handle for enqueueing jobs.
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue a job, fire-and-forget.
    ///
    /// When the queue is full or the worker is gone the job is dropped
    /// with a log line. Ingest never fails because background work could
    /// not be queued.
    pub fn enqueue(&self, job: Job) {
        if let Err(error) = self.tx.try_send(job) {
            warn!(%error, "Dropping background job, queue full or closed");
        }
    }
}

/// Spawn the worker loop and return the job sender plus its join handle.
///
/// Each received job runs on its own task, so a slow dispatch round never
/// delays voiding. Within a `StatementsStored` job, hook dispatch and
/// metadata resolution run concurrently.
///
/// # Errors
///
/// Returns [`TaskError::HttpClient`] when either HTTP client cannot be
/// built.
pub fn spawn_worker(
    stores: Stores,
    config: &TasksConfig,
) -> Result<(JobSender, JoinHandle<()>), TaskError> {
    let client = Arc::new(DeliveryClient::new(&config.dispatch)?);
    let resolver = Arc::new(MetadataResolver::new(&config.resolver)?);
    let dispatch_config = Arc::new(config.dispatch.clone());
    let (tx, mut rx) = mpsc::channel(config.queue.capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let stores = stores.clone();
            let client = Arc::clone(&client);
            let resolver = Arc::clone(&resolver);
            let dispatch_config = Arc::clone(&dispatch_config);
            tokio::spawn(async move {
                match job {
                    Job::StatementsStored { batch } => {
                        tokio::join!(
                            run_hook_dispatch(&stores, &client, &dispatch_config, &batch),
                            run_metadata_resolution(&stores, &resolver, &batch),
                        );
                    }
                    Job::VoidTargets { targets } => run_voiding(&stores, &targets).await,
                }
            });
        }
    });

    Ok((JobSender { tx }, handle))
}
