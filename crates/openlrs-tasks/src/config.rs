//! Configuration for the background job machinery.
//!
//! These structs mirror the `tasks` section of the server's YAML
//! configuration. Every field has a default, so an absent section yields a
//! working setup.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for all background jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TasksConfig {
    /// Job queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Webhook dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Activity metadata resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Job queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of queued jobs before enqueues start dropping.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

/// Webhook dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatchConfig {
    /// Wall-clock budget for one whole dispatch round, in seconds.
    ///
    /// A round that outlives this abandons its remaining hooks.
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// Per-request timeout for a single delivery, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Skip TLS certificate verification for hook endpoints.
    ///
    /// Off by default. Only for consumers on self-signed certificates in
    /// closed environments.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

impl DispatchConfig {
    /// Wall-clock budget for one whole dispatch round.
    pub const fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Timeout for a single delivery request.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            job_timeout_secs: default_job_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            insecure_skip_tls_verify: false,
        }
    }
}

/// Activity metadata resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolverConfig {
    /// Timeout for one activity IRI fetch, in milliseconds.
    ///
    /// Kept short: most activity IRIs are opaque identifiers that do not
    /// resolve, and the fetch should not stall the job worker.
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,
}

impl ResolverConfig {
    /// Timeout for one activity IRI fetch.
    pub const fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: default_resolve_timeout_ms(),
        }
    }
}

const fn default_queue_capacity() -> usize {
    256
}

const fn default_job_timeout_secs() -> u64 {
    30
}

const fn default_request_timeout_secs() -> u64 {
    10
}

const fn default_resolve_timeout_ms() -> u64 {
    1_000
}
