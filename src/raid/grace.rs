use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::registry::RaidRegistry;
use crate::event::{EventBus, RaidEvent};
use crate::external::RaidDetector;

/// Drives each record through Active -> Grace -> Purged.
///
/// A raid-end signal either removes the record immediately (no grace) or
/// freezes it and arms a deferred purge. Purges are never cancelled: one
/// that fires after the record is already gone simply removes nothing.
pub struct GraceScheduler {
    registry: Arc<RaidRegistry>,
    detector: Arc<dyn RaidDetector>,
    event_bus: EventBus,
}

impl GraceScheduler {
    pub fn new(
        registry: Arc<RaidRegistry>,
        detector: Arc<dyn RaidDetector>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            registry,
            detector,
            event_bus,
        }
    }

    /// Reacts to the external raid-end signal. A missing grace feature
    /// counts as zero grace: the raid closes on the spot.
    #[instrument(skip(self))]
    pub fn handle_raid_end(&self, attacking_group: &str, defending_group: &str) {
        let grace_minutes = self.detector.grace_minutes(defending_group).unwrap_or(0);

        let Some(record) = self.registry.find_defending(defending_group) else {
            warn!(
                attacking = attacking_group,
                defending = defending_group,
                "raid end signal for an untracked pair, ignoring"
            );
            return;
        };

        if grace_minutes <= 0 {
            debug!(raid_id = %record.id(), "no grace period, closing raid immediately");
            self.close_pair(attacking_group, defending_group);
            return;
        }

        // One extra minute of slack over the reported grace guards against
        // drift between our clock and the external countdown.
        let grace_millis = (grace_minutes + 1) * 60_000;
        let deadline = Utc::now() + chrono::Duration::milliseconds(grace_millis);

        if record.enter_grace(deadline) {
            info!(
                raid_id = %record.id(),
                grace_minutes,
                deadline = %deadline,
                "raid entered grace, stats frozen"
            );
        }

        self.schedule_purge(
            attacking_group.to_string(),
            defending_group.to_string(),
            Duration::from_millis(grace_millis as u64),
        );
    }

    /// Arms the deferred purge for a pair. Also used on restore, with the
    /// remaining delay recomputed from the persisted deadline.
    pub fn schedule_purge(&self, attacking_group: String, defending_group: String, delay: Duration) {
        debug!(
            attacking = %attacking_group,
            defending = %defending_group,
            delay_secs = delay.as_secs(),
            "scheduling raid purge"
        );

        let registry = self.registry.clone();
        let event_bus = self.event_bus.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let removed = registry.remove(&attacking_group, &defending_group);
            if removed.is_empty() {
                debug!(
                    attacking = %attacking_group,
                    defending = %defending_group,
                    "purge fired for an already-removed raid"
                );
            }
            for record in removed {
                info!(raid_id = %record.id(), "grace period elapsed, raid purged");
                event_bus.emit(RaidEvent::RaidClosed {
                    raid: record.snapshot(),
                });
            }
        });
    }

    fn close_pair(&self, attacking_group: &str, defending_group: &str) {
        for record in self.registry.remove(attacking_group, defending_group) {
            info!(raid_id = %record.id(), "raid closed");
            self.event_bus.emit(RaidEvent::RaidClosed {
                raid: record.snapshot(),
            });
        }
    }
}
