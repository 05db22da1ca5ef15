use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Snapshot of a live raid as reported by the external detection subsystem.
///
/// The detector owns the real raid object; records in this crate hold one of
/// these snapshots, refreshed by the periodic resync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRaid {
    pub raiding_group: String,
    pub raided_group: String,
    /// Whether the defenders have discovered the raid.
    pub discovered: bool,
    pub time_since_start: Duration,
    pub time_left: Duration,
}

/// One entry of the external grace-period table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GracePeriod {
    pub raiding_group: String,
    pub minutes_left: i64,
}

/// Queries this crate consumes from the external raid-detection subsystem.
///
/// All answers come from the host's in-memory state, so the trait is
/// synchronous. Location-based territory checks are resolved at the host
/// boundary before events reach this crate and are deliberately absent here.
pub trait RaidDetector: Send + Sync {
    /// Remaining grace minutes for a defending group, or `None` when the
    /// grace feature is absent or unloaded. Callers treat `None` as zero.
    fn grace_minutes(&self, defending_group: &str) -> Option<i64>;

    /// Every raid the external subsystem currently considers active.
    fn active_raids(&self) -> Vec<ExternalRaid>;

    /// The full grace table: defending group -> (raiding group, minutes left).
    fn grace_periods(&self) -> HashMap<String, GracePeriod>;

    /// Whether a group currently owns the shared contestable outpost,
    /// making it a defender outside any direct raid pairing.
    fn owns_shared_outpost(&self, group_id: &str) -> bool;

    /// Display-name lookup for a group id.
    fn group_tag(&self, group_id: &str) -> Option<String>;
}

/// Detector for hosts running without the raid feature: no raids, no grace,
/// no outpost. With this detector every raid ends with zero grace.
#[derive(Debug, Default)]
pub struct NoopRaidDetector;

impl RaidDetector for NoopRaidDetector {
    fn grace_minutes(&self, _defending_group: &str) -> Option<i64> {
        None
    }

    fn active_raids(&self) -> Vec<ExternalRaid> {
        Vec::new()
    }

    fn grace_periods(&self) -> HashMap<String, GracePeriod> {
        HashMap::new()
    }

    fn owns_shared_outpost(&self, _group_id: &str) -> bool {
        false
    }

    fn group_tag(&self, _group_id: &str) -> Option<String> {
        None
    }
}
