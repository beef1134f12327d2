//! Background jobs for the LRS: webhook dispatch, activity metadata
//! resolution, and statement voiding.
//!
//! Ingest hands finished batches to a job queue and returns; everything in
//! this crate runs after the fact, best-effort, against the shared stores.
//! The governing rule is isolation: one broken hook, unreachable endpoint,
//! or unresolvable activity IRI affects nothing but itself.
//!
//! # Modules
//!
//! - [`queue`] -- the job queue and worker loop
//! - [`hooks`] -- the per-batch hook dispatch round
//! - [`dispatch`] -- payload construction, signing, and delivery
//! - [`resolver`] -- activity metadata fetch and merge
//! - [`voiding`] -- marking statements voided
//! - [`config`] -- settings for all of the above
//! - [`error`] -- setup errors

pub mod config;
pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod queue;
pub mod resolver;
pub mod voiding;

// Re-export primary types for convenience.
pub use config::{DispatchConfig, QueueConfig, ResolverConfig, TasksConfig};
pub use dispatch::DeliveryClient;
pub use error::TaskError;
pub use hooks::run_hook_dispatch;
pub use queue::{Job, JobSender, spawn_worker};
pub use resolver::{MetadataResolver, run_metadata_resolution};
pub use voiding::run_voiding;
