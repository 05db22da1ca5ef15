use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::grace::GraceScheduler;
use super::models::{RaidRecord, RaidSnapshot};
use super::registry::RaidRegistry;
use super::resync_task::{start_resync_task, ResyncConfig};
use crate::event::{EventBus, EventDispatcher, EventError, EventHandler, RaidEvent};
use crate::external::RaidDetector;
use crate::shared::TrackerConfig;
use crate::stats::CombatStatsSubscriber;
use crate::storage::{RaidStore, StorageError};

/// The tracker the host constructs once at startup and tears down at
/// shutdown. Owns the registry, the grace scheduler, the event bus and the
/// checkpoint store; everything else takes these by `Arc`.
pub struct TrackerService {
    config: TrackerConfig,
    detector: Arc<dyn RaidDetector>,
    store: Arc<dyn RaidStore>,
    registry: Arc<RaidRegistry>,
    scheduler: Arc<GraceScheduler>,
    event_bus: EventBus,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl TrackerService {
    pub fn builder(
        detector: Arc<dyn RaidDetector>,
        store: Arc<dyn RaidStore>,
    ) -> TrackerServiceBuilder {
        TrackerServiceBuilder::new(detector, store)
    }

    /// Restores the previous checkpoint, wires the event pipeline and spawns
    /// the periodic resync task.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        self.restore().await;

        let mut dispatcher = EventDispatcher::new(self.event_bus.clone());
        dispatcher.add_handler(Arc::new(LifecycleSubscriber::new(
            self.registry.clone(),
            self.scheduler.clone(),
        )));
        dispatcher.add_handler(Arc::new(CombatStatsSubscriber::new(self.registry.clone())));
        for handler in &self.handlers {
            dispatcher.add_handler(handler.clone());
        }
        dispatcher.start_listening().await;

        tokio::spawn(start_resync_task(
            self.registry.clone(),
            self.detector.clone(),
            ResyncConfig {
                interval: self.config.resync_interval,
            },
        ));

        info!("raid tracker started");
    }

    /// Writes the full checkpoint. Called once at host shutdown; the write
    /// is synchronous with the caller since it is off the hot path.
    pub async fn shutdown(&self) -> Result<(), StorageError> {
        let snapshots: Vec<RaidSnapshot> = self
            .registry
            .list_all()
            .iter()
            .map(|record| record.snapshot())
            .collect();

        match self.store.save(&snapshots).await {
            Ok(()) => {
                info!(count = snapshots.len(), "raid checkpoint saved");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to save raid checkpoint");
                Err(e)
            }
        }
    }

    async fn restore(&self) {
        let snapshots = match self.store.load().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!(error = %e, "failed to load raid checkpoint, starting with an empty registry");
                return;
            }
        };

        let active = self.detector.active_raids();
        let grace_table = self.detector.grace_periods();
        let mut restored = 0;
        let mut dropped = 0;

        for snapshot in snapshots {
            if snapshot.grace_elapsed(Utc::now()) {
                debug!(raid_id = %snapshot.id, "dropping raid whose grace elapsed while offline");
                dropped += 1;
                continue;
            }

            let record = Arc::new(RaidRecord::from_snapshot(snapshot));
            let external = active.iter().find(|external| {
                external.raided_group == record.defending_group()
                    && external.raiding_group == record.attacking_group()
            });
            if let Some(handle) = external {
                record.attach_external(handle.clone());
            }

            self.registry.insert(record.clone());
            restored += 1;

            if let Some(deadline) = record.purge_deadline() {
                // Resume the in-flight grace timer with whatever is left.
                let remaining = (deadline - Utc::now()).to_std().unwrap_or_default();
                self.scheduler.schedule_purge(
                    record.attacking_group().to_string(),
                    record.defending_group().to_string(),
                    remaining,
                );
            } else if external.is_none() {
                // No live raid and not yet frozen: the raid may have ended
                // while we were offline. The external grace table is the
                // only remaining signal for that.
                if let Some(period) = grace_table.get(record.defending_group()) {
                    let grace_millis = (period.minutes_left.max(0) + 1) * 60_000;
                    let deadline = Utc::now() + chrono::Duration::milliseconds(grace_millis);
                    if record.enter_grace(deadline) {
                        info!(
                            raid_id = %record.id(),
                            minutes_left = period.minutes_left,
                            "raid ended while offline, resuming grace from the external timer"
                        );
                    }
                    self.scheduler.schedule_purge(
                        record.attacking_group().to_string(),
                        record.defending_group().to_string(),
                        Duration::from_millis(grace_millis as u64),
                    );
                }
            }
        }

        if restored > 0 || dropped > 0 {
            info!(restored, dropped, "raid checkpoint restored");
        }
    }

    // Query surface for display layers.

    pub fn raid_by_id(&self, id: Uuid) -> Option<Arc<RaidRecord>> {
        self.registry.find_by_id(id)
    }

    pub fn defending_raid(&self, group: &str) -> Option<Arc<RaidRecord>> {
        self.registry.find_defending(group)
    }

    pub fn raids_between(&self, group_a: &str, group_b: &str) -> Vec<Arc<RaidRecord>> {
        self.registry.find_all_between(group_a, group_b)
    }

    pub fn list_raids(&self) -> Vec<Arc<RaidRecord>> {
        self.registry.list_all()
    }

    /// Display name for a group, falling back to the raw id when the
    /// external subsystem has no tag for it.
    pub fn group_display_name(&self, group_id: &str) -> String {
        self.detector
            .group_tag(group_id)
            .unwrap_or_else(|| group_id.to_string())
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn registry(&self) -> &Arc<RaidRegistry> {
        &self.registry
    }
}

/// Builder wiring the tracker's collaborators together.
pub struct TrackerServiceBuilder {
    detector: Arc<dyn RaidDetector>,
    store: Arc<dyn RaidStore>,
    config: TrackerConfig,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl TrackerServiceBuilder {
    fn new(detector: Arc<dyn RaidDetector>, store: Arc<dyn RaidStore>) -> Self {
        Self {
            detector,
            store,
            config: TrackerConfig::default(),
            handlers: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an additional event handler, e.g. a reward distributor
    /// listening for `RaidClosed`.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> TrackerService {
        let event_bus = EventBus::new(self.config.event_capacity);
        let registry = Arc::new(RaidRegistry::new(self.detector.clone()));
        let scheduler = Arc::new(GraceScheduler::new(
            registry.clone(),
            self.detector.clone(),
            event_bus.clone(),
        ));

        TrackerService {
            config: self.config,
            detector: self.detector,
            store: self.store,
            registry,
            scheduler,
            event_bus,
            handlers: self.handlers,
        }
    }
}

/// Reacts to raid lifecycle signals from the external detector.
pub struct LifecycleSubscriber {
    registry: Arc<RaidRegistry>,
    scheduler: Arc<GraceScheduler>,
}

impl LifecycleSubscriber {
    pub fn new(registry: Arc<RaidRegistry>, scheduler: Arc<GraceScheduler>) -> Self {
        Self {
            registry,
            scheduler,
        }
    }
}

#[async_trait]
impl EventHandler for LifecycleSubscriber {
    async fn handle(&self, event: &RaidEvent) -> Result<(), EventError> {
        match event {
            RaidEvent::RaidStarted {
                attacking_group,
                defending_group,
                handle,
            } => {
                self.registry
                    .create_raid(attacking_group, defending_group, handle.clone());
            }
            RaidEvent::RaidEnded {
                attacking_group,
                defending_group,
            } => {
                self.scheduler.handle_raid_end(attacking_group, defending_group);
            }
            _ => {}
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "LifecycleSubscriber"
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;
    use crate::external::test_utils::ScriptedDetector;
    use crate::stats::StatDimension;
    use crate::storage::InMemoryStore;

    struct Fixture {
        service: TrackerService,
        detector: Arc<ScriptedDetector>,
        store: Arc<InMemoryStore>,
    }

    fn fixture() -> Fixture {
        let detector = Arc::new(ScriptedDetector::new());
        let store = Arc::new(InMemoryStore::new());
        let service = TrackerService::builder(detector.clone(), store.clone()).build();
        Fixture {
            service,
            detector,
            store,
        }
    }

    fn snapshot_of(attacking: &str, defending: &str, purge_deadline_ms: i64) -> RaidSnapshot {
        let record = RaidRecord::new(attacking, defending, None);
        record.update_stat(attacking, Uuid::new_v4(), |s| s.add_kills(3));
        let mut snapshot = record.snapshot();
        snapshot.purge_deadline_ms = purge_deadline_ms;
        snapshot
    }

    #[tokio::test(start_paused = true)]
    async fn restore_rebuilds_records_and_reattaches_handles() {
        let f = fixture();
        f.store.save(&[snapshot_of("alpha", "beta", -1)]).await.unwrap();
        f.detector.add_active_raid("alpha", "beta");

        f.service.start().await;

        let raids = f.service.list_raids();
        assert_eq!(raids.len(), 1);
        assert_eq!(raids[0].totals("alpha")[&StatDimension::Kills], 3);
        assert!(raids[0].external().is_some());
        assert!(!raids[0].is_grace());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_drops_snapshots_whose_grace_elapsed_offline() {
        let f = fixture();
        let elapsed = Utc::now().timestamp_millis() - 1_000;
        f.store.save(&[snapshot_of("alpha", "beta", elapsed)]).await.unwrap();

        f.service.start().await;

        assert!(f.service.list_raids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_resumes_a_live_grace_timer() {
        let f = fixture();
        let deadline = Utc::now().timestamp_millis() + 90_000;
        f.store.save(&[snapshot_of("alpha", "beta", deadline)]).await.unwrap();

        f.service.start().await;
        let raids = f.service.list_raids();
        assert_eq!(raids.len(), 1);
        assert!(raids[0].is_grace());

        sleep(Duration::from_secs(91)).await;
        assert!(f.service.list_raids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_freezes_raids_that_ended_while_offline() {
        let f = fixture();
        f.store.save(&[snapshot_of("alpha", "beta", -1)]).await.unwrap();
        // No active raid anymore, but the external grace table still has an
        // entry for the defender: the raid ended during downtime.
        f.detector.set_grace("beta", "alpha", 2);

        f.service.start().await;
        let raids = f.service.list_raids();
        assert_eq!(raids.len(), 1);
        assert!(raids[0].is_grace());

        sleep(Duration::from_secs(3 * 60 + 1)).await;
        assert!(f.service.list_raids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_checkpoints_every_tracked_raid() {
        let f = fixture();
        f.service.start().await;
        let record = f.service.registry().create_raid("alpha", "beta", None);
        record.update_stat("alpha", Uuid::new_v4(), |s| s.add_damage_given(4.5));

        f.service.shutdown().await.unwrap();

        let saved = f.store.load().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, record.id());
        assert_eq!(saved[0].totals("alpha")[&StatDimension::DamageGiven], 4);
    }

    #[tokio::test(start_paused = true)]
    async fn group_display_name_prefers_the_external_tag() {
        let f = fixture();
        f.detector.set_tag("alpha", "The Alpha Pact");

        assert_eq!(f.service.group_display_name("alpha"), "The Alpha Pact");
        assert_eq!(f.service.group_display_name("beta"), "beta");
    }
}
