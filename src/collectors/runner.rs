use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{CollectStats, CollectorService, MessageFeed};

/// Drain a feed through the collector until it is exhausted or `shutdown`
/// fires. Individual messages never stop the loop; a read error does.
pub async fn run(
    feed: &mut dyn MessageFeed,
    collector: Arc<CollectorService>,
    shutdown: CancellationToken,
) -> anyhow::Result<CollectStats> {
    let mut stats = CollectStats::default();
    tracing::info!(feed = feed.name(), "Collector started");

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::info!("Shutdown signal received, stopping collector");
                break;
            }
            next = feed.next_message() => next?,
        };
        let Some(msg) = next else {
            break;
        };
        stats.record(&collector.handle(msg).await);
    }

    tracing::info!(
        feed = feed.name(),
        submitted = stats.submitted,
        filtered = stats.filtered,
        duplicate = stats.duplicate,
        empty = stats.empty,
        failed = stats.failed,
        "Collector finished"
    );
    Ok(stats)
}
