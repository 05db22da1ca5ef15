use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::event::{EventError, EventHandler, RaidEvent};
use crate::raid::RaidRegistry;

/// Applies combat and placement events to the tracked raids.
///
/// Kills and damage are attributed to the record's raiding or defending
/// side depending on which side the acting player's group is on; every raid
/// matching the two groups is updated, which covers the case of a direct
/// raid and an outpost contest running at the same time. Records in grace
/// are skipped, and events touching no tracked raid are dropped silently.
pub struct CombatStatsSubscriber {
    registry: Arc<RaidRegistry>,
}

impl CombatStatsSubscriber {
    pub fn new(registry: Arc<RaidRegistry>) -> Self {
        Self { registry }
    }

    fn record_kill(&self, killer: Uuid, victim: Uuid, killer_group: &str, victim_group: &str) {
        let raids = self.registry.find_all_between(killer_group, victim_group);
        if raids.is_empty() {
            debug!(killer_group, victim_group, "kill outside any tracked raid");
            return;
        }

        for raid in raids {
            if raid.is_grace() {
                continue;
            }

            if raid.attacking_group() == killer_group {
                raid.update_stat(raid.attacking_group(), killer, |s| s.add_kills(1));
                raid.update_stat(raid.defending_group(), victim, |s| s.add_deaths(1));
            } else {
                raid.update_stat(raid.defending_group(), killer, |s| s.add_kills(1));
                raid.update_stat(raid.attacking_group(), victim, |s| s.add_deaths(1));
            }
        }
    }

    fn record_damage(
        &self,
        attacker: Uuid,
        victim: Uuid,
        attacker_group: &str,
        victim_group: &str,
        amount: f64,
    ) {
        let raids = self.registry.find_all_between(attacker_group, victim_group);
        if raids.is_empty() {
            debug!(attacker_group, victim_group, "damage outside any tracked raid");
            return;
        }

        for raid in raids {
            if raid.is_grace() {
                continue;
            }

            if raid.attacking_group() == attacker_group {
                raid.update_stat(raid.attacking_group(), attacker, |s| s.add_damage_given(amount));
                raid.update_stat(raid.defending_group(), victim, |s| s.add_damage_taken(amount));
            } else {
                raid.update_stat(raid.defending_group(), attacker, |s| s.add_damage_given(amount));
                raid.update_stat(raid.attacking_group(), victim, |s| s.add_damage_taken(amount));
            }
        }
    }

    fn record_block_placed(&self, player: Uuid, territory_group: &str) {
        let Some(raid) = self.registry.find_defending(territory_group) else {
            debug!(territory_group, "block placed outside any tracked raid");
            return;
        };
        if raid.is_grace() {
            return;
        }

        raid.update_stat(territory_group, player, |s| s.add_blocks_placed());
    }
}

#[async_trait]
impl EventHandler for CombatStatsSubscriber {
    async fn handle(&self, event: &RaidEvent) -> Result<(), EventError> {
        match event {
            RaidEvent::PlayerKilled {
                killer,
                victim,
                killer_group,
                victim_group,
            } => self.record_kill(*killer, *victim, killer_group, victim_group),
            RaidEvent::DamageDealt {
                attacker,
                victim,
                attacker_group,
                victim_group,
                amount,
            } => self.record_damage(*attacker, *victim, attacker_group, victim_group, *amount),
            RaidEvent::BlockPlaced {
                player,
                territory_group,
            } => self.record_block_placed(*player, territory_group),
            _ => {}
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "CombatStatsSubscriber"
    }
}
