//! Error types for background task setup.

use thiserror::Error;

/// Errors raised while wiring up the background task machinery.
///
/// Runtime failures inside the jobs themselves (unreachable endpoints,
/// unresolvable activity IRIs, hooks with broken registrations) are not
/// represented here: the jobs log them and carry on, and nothing about a
/// single hook or activity may abort a whole round.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Building the shared HTTP client failed.
    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        /// The underlying client construction error.
        #[from]
        source: reqwest::Error,
    },
}
