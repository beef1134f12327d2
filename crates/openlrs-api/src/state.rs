//! Shared application state for the ingest API.

use openlrs_store::Stores;
use openlrs_tasks::JobSender;

/// State shared by every handler.
///
/// Both halves are cheap clone handles over shared machinery: the stores
/// are the same ones the background worker reads, and the job sender
/// feeds that worker.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The shared record stores.
    pub stores: Stores,
    /// Handle into the background job queue.
    pub jobs: JobSender,
}

impl AppState {
    /// Bundle stores and job sender into handler state.
    pub const fn new(stores: Stores, jobs: JobSender) -> Self {
        Self { stores, jobs }
    }
}
