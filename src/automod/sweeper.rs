//! Periodic trim of the activity windows.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::automod::activity::ActivityTracker;
use crate::config::SweeperConfig;

/// Run the sweep loop until cancelled.
///
/// Each pass ages out stale timestamps, caps content rings and drops empty
/// entries so tracking memory stays bounded under sustained traffic. An
/// unexpected failure in one pass never stops the loop.
pub async fn run_sweeper(
    tracker: Arc<Mutex<ActivityTracker>>,
    config: SweeperConfig,
    cancel: CancellationToken,
) {
    let mut tick = tokio::time::interval(config.interval);
    // the interval's immediate first tick would sweep an empty tracker
    tick.tick().await;

    info!(interval_secs = config.interval.as_secs(), "Sweeper started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Sweeper shutting down");
                return;
            }
            _ = tick.tick() => {
                let stats = tracker.lock().await.sweep(Utc::now());
                if stats.dropped_timestamps > 0 || stats.dropped_entries > 0 {
                    debug!(
                        dropped_timestamps = stats.dropped_timestamps,
                        dropped_entries = stats.dropped_entries,
                        "Sweep pass complete"
                    );
                }
            }
        }
    }
}
