use std::collections::HashMap;

use strum::IntoEnumIterator;
use uuid::Uuid;

use super::models::{PlayerStats, StatDimension};

/// Sums every stat dimension over a group's participants.
///
/// All dimensions are present in the result, defaulting to zero, so callers
/// never have to distinguish "no participants" from "nobody scored".
pub fn group_totals(stats: &HashMap<Uuid, PlayerStats>) -> HashMap<StatDimension, i64> {
    let mut totals: HashMap<StatDimension, i64> =
        StatDimension::iter().map(|dimension| (dimension, 0)).collect();

    for accumulator in stats.values() {
        for dimension in StatDimension::iter() {
            *totals.entry(dimension).or_insert(0) += dimension.value_of(accumulator);
        }
    }

    totals
}

/// Top `limit` participants by descending value of `dimension`.
///
/// Returns `min(limit, participant count)` entries; `limit == 0` yields an
/// empty list. Order among equal-valued entries is unspecified.
pub fn top_participants(
    stats: &HashMap<Uuid, PlayerStats>,
    dimension: StatDimension,
    limit: usize,
) -> Vec<(Uuid, PlayerStats)> {
    if limit == 0 {
        return Vec::new();
    }

    let mut entries: Vec<(Uuid, PlayerStats)> = stats
        .iter()
        .map(|(participant, accumulator)| (*participant, accumulator.clone()))
        .collect();

    entries.sort_by(|a, b| dimension.value_of(&b.1).cmp(&dimension.value_of(&a.1)));
    entries.truncate(limit);
    entries
}
