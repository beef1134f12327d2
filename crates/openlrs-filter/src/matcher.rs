//! Matching stored statements against compiled predicates.

use std::collections::BTreeSet;
use std::sync::Arc;

use openlrs_store::StatementStore;
use openlrs_types::{StatementId, StoredStatement};

use crate::predicate::Predicate;

/// Find the statements of a batch that satisfy a predicate.
///
/// Unknown ids are skipped, voided statements never match, and each
/// statement appears at most once even when the batch repeats an id.
/// An empty result is a normal outcome, not an error.
pub async fn find_matches(
    store: &StatementStore,
    batch: &[StatementId],
    predicate: &Predicate,
) -> Vec<Arc<StoredStatement>> {
    let mut seen = BTreeSet::new();
    let mut matches = Vec::new();
    for statement in store.get_many(batch).await {
        if statement.voided || !seen.insert(statement.id) {
            continue;
        }
        if predicate.matches(&statement) {
            matches.push(statement);
        }
    }
    matches
}
