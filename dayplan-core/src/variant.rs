//! Variant selection: which version of a task fits the time and energy left.

use crate::context::SleepQuality;
use crate::task::{Task, Variant};

/// Energy estimate blended with sleep quality.
pub fn blended_energy(energy: i32, sleep: SleepQuality) -> f64 {
    (energy as f64 + sleep.score() as f64 / 2.0) / 1.5
}

/// Below this blended energy the lightest fitting variant always wins.
const LOW_ENERGY_THRESHOLD: f64 = 3.5;

/// Pick a variant for `task`, or `None` when it has none (nominal is used).
///
/// Under time pressure speed dominates: the shortest variant that fits,
/// ignoring energy. When nothing fits, the shortest variant is returned
/// anyway and the plan may overflow slightly.
pub fn pick_variant(
    task: &Task,
    energy: i32,
    sleep: SleepQuality,
    time_remaining: i32,
    time_pressure: bool,
) -> Option<&Variant> {
    let shortest = task.shortest_variant()?;

    let mut by_duration: Vec<&Variant> = task.variants.iter().collect();
    by_duration.sort_by_key(|v| v.duration_minutes);
    let fitting: Vec<&Variant> = by_duration
        .into_iter()
        .filter(|v| v.duration_minutes <= time_remaining)
        .collect();

    let Some(&lightest_fit) = fitting.first() else {
        return Some(shortest);
    };

    if time_pressure {
        return Some(lightest_fit);
    }

    let effective = blended_energy(energy, sleep);
    if effective < LOW_ENERGY_THRESHOLD {
        return Some(lightest_fit);
    }

    // Strict comparison keeps the first of equally close variants.
    let mut best = lightest_fit;
    let mut best_gap = (best.energy_required as f64 - effective).abs();
    for &v in &fitting[1..] {
        let gap = (v.energy_required as f64 - effective).abs();
        if gap < best_gap {
            best = v;
            best_gap = gap;
        }
    }
    Some(best)
}
