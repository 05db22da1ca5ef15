use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::external::ExternalRaid;
use crate::stats::{self, PlayerStats, StatDimension};

/// Sentinel deadline meaning "raid still active, not in grace".
const NOT_IN_GRACE: i64 = -1;

/// One tracked raid: the opposing group pair, per-participant stats for each
/// side, an optional handle into the external raid object, and the grace
/// deadline.
///
/// The stat maps sit behind a per-record lock so updates to different raids
/// never contend; the grace deadline is an atomic epoch-millisecond value so
/// `is_grace` checks are lock-free. The freeze check inside `update_stat`
/// runs under the stat lock, which makes the grace freeze authoritative: a
/// record in grace never changes its totals.
#[derive(Debug)]
pub struct RaidRecord {
    id: Uuid,
    attacking_group: String,
    defending_group: String,
    stats: RwLock<HashMap<String, HashMap<Uuid, PlayerStats>>>,
    external: RwLock<Option<ExternalRaid>>,
    purge_deadline_ms: AtomicI64,
}

impl RaidRecord {
    pub fn new(attacking_group: &str, defending_group: &str, external: Option<ExternalRaid>) -> Self {
        let mut stats = HashMap::new();
        stats.insert(attacking_group.to_string(), HashMap::new());
        stats.insert(defending_group.to_string(), HashMap::new());

        Self {
            id: Uuid::new_v4(),
            attacking_group: attacking_group.to_string(),
            defending_group: defending_group.to_string(),
            stats: RwLock::new(stats),
            external: RwLock::new(external),
            purge_deadline_ms: AtomicI64::new(NOT_IN_GRACE),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn attacking_group(&self) -> &str {
        &self.attacking_group
    }

    pub fn defending_group(&self) -> &str {
        &self.defending_group
    }

    /// True once the raid has ended and entered its grace cooldown.
    pub fn is_grace(&self) -> bool {
        self.purge_deadline_ms.load(Ordering::Acquire) != NOT_IN_GRACE
    }

    /// The scheduled purge instant, if the record is in grace.
    pub fn purge_deadline(&self) -> Option<DateTime<Utc>> {
        match self.purge_deadline_ms.load(Ordering::Acquire) {
            NOT_IN_GRACE => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    /// Transitions into grace, freezing all stats. Grace is entered exactly
    /// once; a second call is ignored and reported as a programmer error.
    pub fn enter_grace(&self, deadline: DateTime<Utc>) -> bool {
        // Hold the stat lock so no in-flight update straddles the freeze.
        let _stats = self.stats.write().unwrap();
        let entered = self
            .purge_deadline_ms
            .compare_exchange(
                NOT_IN_GRACE,
                deadline.timestamp_millis(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if !entered {
            warn!(raid_id = %self.id, "enter_grace called on a record already in grace");
        }
        entered
    }

    /// Applies `mutation` to the participant's accumulator, creating it on
    /// first use. Dropped silently when the record is in grace or when
    /// `group` is not one of the record's two sides.
    pub fn update_stat<F>(&self, group: &str, participant: Uuid, mutation: F)
    where
        F: FnOnce(&mut PlayerStats),
    {
        let mut stats = self.stats.write().unwrap();
        if self.is_grace() {
            debug!(raid_id = %self.id, group, "stat update dropped, record in grace");
            return;
        }

        match stats.get_mut(group) {
            Some(participants) => {
                mutation(participants.entry(participant).or_default());
            }
            None => {
                debug!(raid_id = %self.id, group, "stat update for a group not part of this raid");
            }
        }
    }

    /// Cloned per-participant stats for one side. Unknown groups yield an
    /// empty map.
    pub fn stats_for_group(&self, group: &str) -> HashMap<Uuid, PlayerStats> {
        self.stats
            .read()
            .unwrap()
            .get(group)
            .cloned()
            .unwrap_or_default()
    }

    /// Per-dimension sums over one side's participants, computed on demand.
    pub fn totals(&self, group: &str) -> HashMap<StatDimension, i64> {
        stats::group_totals(&self.stats_for_group(group))
    }

    /// Top `limit` participants of one side by descending `dimension`.
    pub fn top_participants(
        &self,
        group: &str,
        dimension: StatDimension,
        limit: usize,
    ) -> Vec<(Uuid, PlayerStats)> {
        stats::top_participants(&self.stats_for_group(group), dimension, limit)
    }

    pub fn attach_external(&self, handle: ExternalRaid) {
        *self.external.write().unwrap() = Some(handle);
    }

    pub fn external(&self) -> Option<ExternalRaid> {
        self.external.read().unwrap().clone()
    }

    /// Serializable copy of the record for checkpointing and for the
    /// lifecycle-end notification.
    pub fn snapshot(&self) -> RaidSnapshot {
        RaidSnapshot {
            id: self.id,
            attacking_group: self.attacking_group.clone(),
            defending_group: self.defending_group.clone(),
            purge_deadline_ms: self.purge_deadline_ms.load(Ordering::Acquire),
            stats: self.stats.read().unwrap().clone(),
        }
    }

    /// Rebuilds a record from its persisted form. The external handle is
    /// re-attached separately by the restore path.
    pub fn from_snapshot(snapshot: RaidSnapshot) -> Self {
        let mut stats = snapshot.stats;
        stats.entry(snapshot.attacking_group.clone()).or_default();
        stats.entry(snapshot.defending_group.clone()).or_default();

        Self {
            id: snapshot.id,
            attacking_group: snapshot.attacking_group,
            defending_group: snapshot.defending_group,
            stats: RwLock::new(stats),
            external: RwLock::new(None),
            purge_deadline_ms: AtomicI64::new(snapshot.purge_deadline_ms),
        }
    }
}

/// Durable form of a raid record: one entry of the checkpoint file, also the
/// payload of the `RaidClosed` notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidSnapshot {
    pub id: Uuid,
    pub attacking_group: String,
    pub defending_group: String,
    /// Epoch milliseconds; -1 means the raid was still active.
    pub purge_deadline_ms: i64,
    pub stats: HashMap<String, HashMap<Uuid, PlayerStats>>,
}

impl RaidSnapshot {
    pub fn in_grace(&self) -> bool {
        self.purge_deadline_ms != NOT_IN_GRACE
    }

    /// Whether the persisted grace deadline already passed at `now`.
    pub fn grace_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.in_grace() && self.purge_deadline_ms <= now.timestamp_millis()
    }

    /// Per-dimension sums for one side, same semantics as on the live record.
    pub fn totals(&self, group: &str) -> HashMap<StatDimension, i64> {
        match self.stats.get(group) {
            Some(participants) => stats::group_totals(participants),
            None => stats::group_totals(&HashMap::new()),
        }
    }
}
