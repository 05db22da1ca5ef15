use std::sync::{Arc, RwLock};

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::RaidRecord;
use crate::external::{ExternalRaid, RaidDetector};

/// The concurrent collection of all tracked raids.
///
/// Lookups scan a small vector (a server has at most tens of concurrent
/// raids); per-record stat mutation happens under each record's own lock, so
/// the registry lock is only held for the rare structural operations.
pub struct RaidRegistry {
    raids: RwLock<Vec<Arc<RaidRecord>>>,
    detector: Arc<dyn RaidDetector>,
}

impl RaidRegistry {
    pub fn new(detector: Arc<dyn RaidDetector>) -> Self {
        Self {
            raids: RwLock::new(Vec::new()),
            detector,
        }
    }

    /// Allocates and inserts a fresh record for a newly detected raid.
    /// Pair uniqueness is enforced upstream by the detection subsystem.
    pub fn create_raid(
        &self,
        attacking_group: &str,
        defending_group: &str,
        external: Option<ExternalRaid>,
    ) -> Arc<RaidRecord> {
        let record = Arc::new(RaidRecord::new(attacking_group, defending_group, external));
        info!(
            raid_id = %record.id(),
            attacking = attacking_group,
            defending = defending_group,
            "tracking new raid"
        );
        self.raids.write().unwrap().push(record.clone());
        record
    }

    /// Inserts an already-built record; used when restoring a checkpoint.
    pub fn insert(&self, record: Arc<RaidRecord>) {
        self.raids.write().unwrap().push(record);
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<Arc<RaidRecord>> {
        self.raids
            .read()
            .unwrap()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// The record where `group` is defending, either directly or because it
    /// currently owns the shared outpost. First match wins.
    pub fn find_defending(&self, group: &str) -> Option<Arc<RaidRecord>> {
        self.raids
            .read()
            .unwrap()
            .iter()
            .find(|record| self.is_defending(record, group))
            .cloned()
    }

    /// Every record whose unordered pair matches {a, b}, counting a side as
    /// defending when it owns the shared outpost. Can return both a direct
    /// raid and an outpost contest at once.
    pub fn find_all_between(&self, group_a: &str, group_b: &str) -> Vec<Arc<RaidRecord>> {
        self.raids
            .read()
            .unwrap()
            .iter()
            .filter(|record| {
                (record.attacking_group() == group_a && self.is_defending(record, group_b))
                    || (record.attacking_group() == group_b && self.is_defending(record, group_a))
            })
            .cloned()
            .collect()
    }

    /// Removes every record matching the pair (alternate-defender rule
    /// included) and returns them so the caller can fire lifecycle-end
    /// notifications. Removal is terminal.
    pub fn remove(&self, attacking_group: &str, defending_group: &str) -> Vec<Arc<RaidRecord>> {
        let mut removed = Vec::new();
        {
            let mut raids = self.raids.write().unwrap();
            raids.retain(|record| {
                let matches = record.attacking_group() == attacking_group
                    && self.is_defending(record, defending_group);
                if matches {
                    removed.push(record.clone());
                }
                !matches
            });
        }

        for record in &removed {
            info!(raid_id = %record.id(), "raid removed from registry");
        }
        removed
    }

    /// Snapshot copy for safe iteration while other tasks mutate.
    pub fn list_all(&self) -> Vec<Arc<RaidRecord>> {
        self.raids.read().unwrap().clone()
    }

    /// Administrative reset.
    pub fn clear_all(&self) {
        let mut raids = self.raids.write().unwrap();
        info!(count = raids.len(), "clearing all tracked raids");
        raids.clear();
    }

    pub fn len(&self) -> usize {
        self.raids.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.raids.read().unwrap().is_empty()
    }

    /// Re-attaches external handles by pair match. Refreshes handles that
    /// are already attached (they are countdown snapshots and go stale);
    /// returns how many records were newly attached. Idempotent.
    #[instrument(skip(self, active))]
    pub fn resync(&self, active: &[ExternalRaid]) -> usize {
        let raids = self.raids.read().unwrap();
        let mut attached = 0;

        for record in raids.iter() {
            let matching = active.iter().find(|external| {
                external.raided_group == record.defending_group()
                    && external.raiding_group == record.attacking_group()
            });
            if let Some(handle) = matching {
                if record.external().is_none() {
                    attached += 1;
                    debug!(raid_id = %record.id(), "attached external raid handle");
                }
                record.attach_external(handle.clone());
            }
        }

        attached
    }

    fn is_defending(&self, record: &RaidRecord, group: &str) -> bool {
        record.defending_group() == group || self.detector.owns_shared_outpost(group)
    }
}
