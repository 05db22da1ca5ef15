use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info};

use super::registry::RaidRegistry;
use crate::external::RaidDetector;

/// Configuration for the periodic resync task.
#[derive(Debug, Clone)]
pub struct ResyncConfig {
    /// How often to reconcile records with the external detector.
    pub interval: Duration,
}

impl Default for ResyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Periodically re-attaches external raid handles to tracked records.
///
/// Heals registry state after a restart or a transient detection gap; a
/// record created before the detector reported its raid picks the handle up
/// on the next tick. Safe to run forever; each pass is idempotent.
pub async fn start_resync_task(
    registry: Arc<RaidRegistry>,
    detector: Arc<dyn RaidDetector>,
    config: ResyncConfig,
) {
    info!(
        interval_secs = config.interval.as_secs(),
        "starting raid resync background task"
    );

    let mut resync_interval = interval(config.interval);

    loop {
        resync_interval.tick().await;

        let active = detector.active_raids();
        let attached = registry.resync(&active);
        if attached > 0 {
            info!(attached, "resync attached external raid handles");
        } else {
            debug!(active = active.len(), "resync pass completed");
        }
    }
}
