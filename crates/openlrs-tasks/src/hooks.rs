//! The per-batch hook dispatch round.

use tracing::{error, warn};

use openlrs_filter::{build_predicate, find_matches};
use openlrs_store::Stores;
use openlrs_types::StatementId;

use crate::config::DispatchConfig;
use crate::dispatch::DeliveryClient;

/// Run one hook dispatch round for a freshly stored batch.
///
/// The round snapshots the hook registry, compiles each hook's filters,
/// matches them against the batch, and delivers to every hook with at
/// least one match. A hook whose registration has gone bad is skipped with
/// a log line; the others still run. The whole round lives under the
/// configured wall-clock budget, and on overrun the remaining hooks are
/// abandoned.
pub async fn run_hook_dispatch(
    stores: &Stores,
    client: &DeliveryClient,
    config: &DispatchConfig,
    batch: &[StatementId],
) {
    let round = dispatch_round(stores, client, batch);
    if tokio::time::timeout(config.job_timeout(), round)
        .await
        .is_err()
    {
        error!("Statement hook round timed out");
    }
}

async fn dispatch_round(stores: &Stores, client: &DeliveryClient, batch: &[StatementId]) {
    for hook in stores.hooks.list().await {
        let config = match hook.parsed_config() {
            Ok(config) => config,
            Err(error) => {
                warn!(hook_id = %hook.id, %error, "Hook delivery config is unusable, skipping");
                continue;
            }
        };
        let predicate = match build_predicate(&hook.filters, &stores.agents).await {
            Ok(predicate) => predicate,
            Err(error) => {
                warn!(hook_id = %hook.id, %error, "Hook filters are malformed, skipping");
                continue;
            }
        };
        let matches = find_matches(&stores.statements, batch, &predicate).await;
        if matches.is_empty() {
            continue;
        }
        client.deliver(hook.id, &config, &matches).await;
    }
}
