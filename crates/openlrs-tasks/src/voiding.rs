//! Statement voiding.
//!
//! Voiding never deletes: the target keeps its document and its id, stops
//! matching hook filters, and stops being served. The flag only ever goes
//! one way.

use tracing::debug;

use openlrs_store::Stores;
use openlrs_types::StatementId;

/// Mark every target statement as voided.
///
/// Unknown targets are ignored; a voiding statement may legitimately
/// reference a statement this LRS never stored.
pub async fn run_voiding(stores: &Stores, targets: &[StatementId]) {
    for &target in targets {
        if !stores.statements.void(target).await {
            debug!(%target, "Voiding target not stored here");
        }
    }
}
