use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use raidstats::{
    EventError, EventHandler, ExternalRaid, GracePeriod, RaidDetector, RaidEvent, RaidSnapshot,
};

/// Scriptable stand-in for the external raid-detection subsystem.
#[derive(Debug, Default)]
pub struct MockRaidDetector {
    grace: Mutex<HashMap<String, GracePeriod>>,
    active: Mutex<Vec<ExternalRaid>>,
    outpost_owner: Mutex<Option<String>>,
    tags: Mutex<HashMap<String, String>>,
}

impl MockRaidDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_grace(&self, defending: &str, raiding: &str, minutes: i64) {
        self.grace.lock().unwrap().insert(
            defending.to_string(),
            GracePeriod {
                raiding_group: raiding.to_string(),
                minutes_left: minutes,
            },
        );
    }

    pub fn add_active_raid(&self, raiding: &str, raided: &str) {
        self.active.lock().unwrap().push(ExternalRaid {
            raiding_group: raiding.to_string(),
            raided_group: raided.to_string(),
            discovered: true,
            time_since_start: Duration::from_secs(120),
            time_left: Duration::from_secs(900),
        });
    }

    pub fn set_outpost_owner(&self, group: Option<&str>) {
        *self.outpost_owner.lock().unwrap() = group.map(str::to_string);
    }

    pub fn set_tag(&self, group: &str, tag: &str) {
        self.tags
            .lock()
            .unwrap()
            .insert(group.to_string(), tag.to_string());
    }
}

impl RaidDetector for MockRaidDetector {
    fn grace_minutes(&self, defending_group: &str) -> Option<i64> {
        self.grace
            .lock()
            .unwrap()
            .get(defending_group)
            .map(|period| period.minutes_left)
    }

    fn active_raids(&self) -> Vec<ExternalRaid> {
        self.active.lock().unwrap().clone()
    }

    fn grace_periods(&self) -> HashMap<String, GracePeriod> {
        self.grace.lock().unwrap().clone()
    }

    fn owns_shared_outpost(&self, group_id: &str) -> bool {
        self.outpost_owner.lock().unwrap().as_deref() == Some(group_id)
    }

    fn group_tag(&self, group_id: &str) -> Option<String> {
        self.tags.lock().unwrap().get(group_id).cloned()
    }
}

/// Host-side handler capturing lifecycle-end notifications, the way a
/// reward distributor would.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    closed: Mutex<Vec<RaidSnapshot>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closed(&self) -> Vec<RaidSnapshot> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &RaidEvent) -> Result<(), EventError> {
        if let RaidEvent::RaidClosed { raid } = event {
            self.closed.lock().unwrap().push(raid.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "RecordingHandler"
    }
}
