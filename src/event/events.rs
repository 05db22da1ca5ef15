use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::external::ExternalRaid;
use crate::raid::RaidSnapshot;

/// Signals flowing through the tracker.
///
/// Events are facts about things that already happened, emitted by the host
/// boundary (combat, placement, raid detection) or by the tracker itself
/// (`RaidClosed`). Handlers react to them; nothing here carries behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RaidEvent {
    /// The external subsystem detected a new raid between two groups.
    RaidStarted {
        attacking_group: String,
        defending_group: String,
        handle: Option<ExternalRaid>,
    },

    /// The external subsystem declared the raid over.
    RaidEnded {
        attacking_group: String,
        defending_group: String,
    },

    /// A participant killed an opposing participant.
    PlayerKilled {
        killer: Uuid,
        victim: Uuid,
        killer_group: String,
        victim_group: String,
    },

    /// A participant damaged an opposing participant.
    DamageDealt {
        attacker: Uuid,
        victim: Uuid,
        attacker_group: String,
        victim_group: String,
        amount: f64,
    },

    /// A participant placed a block inside `territory_group`'s base region
    /// (resolved at the host boundary).
    BlockPlaced {
        player: Uuid,
        territory_group: String,
    },

    /// Lifecycle-end notification: the raid record was purged and these are
    /// its final statistics. Fired exactly once per raid, whether it was
    /// removed immediately or after its grace period.
    RaidClosed { raid: RaidSnapshot },
}

impl RaidEvent {
    /// Short label for logging and metrics.
    pub fn event_type(&self) -> &'static str {
        match self {
            RaidEvent::RaidStarted { .. } => "raid_started",
            RaidEvent::RaidEnded { .. } => "raid_ended",
            RaidEvent::PlayerKilled { .. } => "player_killed",
            RaidEvent::DamageDealt { .. } => "damage_dealt",
            RaidEvent::BlockPlaced { .. } => "block_placed",
            RaidEvent::RaidClosed { .. } => "raid_closed",
        }
    }
}
