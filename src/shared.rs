use std::time::Duration;

/// Tuning knobs for the tracker service.
///
/// Hosts construct one (or take the defaults) and hand it to the service
/// builder; there is no config-file layer in this crate.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often the registry re-syncs with the external raid detector.
    pub resync_interval: Duration,
    /// Capacity of the raid event broadcast channel.
    pub event_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            resync_interval: Duration::from_secs(30),
            event_capacity: 256,
        }
    }
}
