use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Mutable per-participant counters for one raid.
///
/// Damage is accumulated as floating point but only ever read back truncated
/// toward zero, so display and ranking agree on the same integer value.
/// Kill/death deltas may be negative for corrective adjustments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    kills: i64,
    deaths: i64,
    damage_given: f64,
    damage_taken: f64,
    hits_given: i64,
    hits_taken: i64,
    blocks_placed: i64,
}

impl PlayerStats {
    pub fn add_kills(&mut self, kills: i64) {
        self.kills += kills;
    }

    pub fn add_deaths(&mut self, deaths: i64) {
        self.deaths += deaths;
    }

    /// Accumulates outgoing damage and counts the hit that carried it.
    pub fn add_damage_given(&mut self, amount: f64) {
        self.damage_given += amount;
        self.hits_given += 1;
    }

    /// Accumulates incoming damage and counts the hit that carried it.
    pub fn add_damage_taken(&mut self, amount: f64) {
        self.damage_taken += amount;
        self.hits_taken += 1;
    }

    pub fn add_blocks_placed(&mut self) {
        self.blocks_placed += 1;
    }

    pub fn kills(&self) -> i64 {
        self.kills
    }

    pub fn deaths(&self) -> i64 {
        self.deaths
    }

    /// Outgoing damage truncated toward zero.
    pub fn damage_given(&self) -> i64 {
        self.damage_given as i64
    }

    /// Incoming damage truncated toward zero.
    pub fn damage_taken(&self) -> i64 {
        self.damage_taken as i64
    }

    pub fn hits_given(&self) -> i64 {
        self.hits_given
    }

    pub fn hits_taken(&self) -> i64 {
        self.hits_taken
    }

    pub fn blocks_placed(&self) -> i64 {
        self.blocks_placed
    }
}

/// The stat dimensions a participant can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum StatDimension {
    Kills,
    Deaths,
    BlocksPlaced,
    DamageGiven,
    DamageTaken,
    HitsGiven,
    HitsTaken,
}

impl StatDimension {
    /// Reads this dimension's value off an accumulator. Damage dimensions
    /// use the truncated accessors so ranking matches what is displayed.
    pub fn value_of(self, stats: &PlayerStats) -> i64 {
        match self {
            StatDimension::Kills => stats.kills(),
            StatDimension::Deaths => stats.deaths(),
            StatDimension::BlocksPlaced => stats.blocks_placed(),
            StatDimension::DamageGiven => stats.damage_given(),
            StatDimension::DamageTaken => stats.damage_taken(),
            StatDimension::HitsGiven => stats.hits_given(),
            StatDimension::HitsTaken => stats.hits_taken(),
        }
    }
}
