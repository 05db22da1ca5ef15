// Per-participant stat accumulation and ranking.

pub use models::{PlayerStats, StatDimension};
pub use ranking::{group_totals, top_participants};
pub use subscriber::CombatStatsSubscriber;

mod models;
mod ranking;
mod subscriber;
