//! Error types for the record stores.

use openlrs_types::StatementId;

/// Errors that can occur in the record stores.
///
/// The stores are deliberately quiet: reads return `Option`/`Vec` and most
/// writes cannot fail. The variants here are the cases callers must react
/// to rather than log away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A statement with this id is already stored. Statement ids are
    /// immutable once accepted, so a clashing submission is rejected whole.
    #[error("statement {0} is already stored")]
    DuplicateStatement(StatementId),

    /// An agent lookup matched more than one row. Callers must not pick
    /// one silently; on request paths this surfaces to the client, in
    /// filter building it skips the descriptor.
    #[error("agent lookup for '{0}' matched more than one row")]
    AmbiguousAgent(String),
}
