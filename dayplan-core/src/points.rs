//! Points economy.
//!
//! Base points scale with effort (energy x minutes). Low-energy mornings
//! multiply the award so that hard days still feel worth it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Granted once per task when actuals are logged.
pub const FEEDBACK_POINTS: u32 = 15;

/// Granted once per day when every planned item is complete.
pub const PERFECT_DAY_BONUS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsAward {
    pub base: u32,
    pub points: u32,
    pub low_energy_bonus: bool,
    pub multiplier: f64,
}

/// Multiplier for a morning energy reading. Energy 5 and up earns no bonus.
pub fn energy_multiplier(morning_energy: i32) -> f64 {
    match morning_energy {
        i32::MIN..=1 => 3.0,
        2 => 2.5,
        3 => 2.0,
        4 => 1.5,
        _ => 1.0,
    }
}

pub fn calc_points(task: &Task, morning_energy: i32) -> PointsAward {
    let effort = (task.energy_required as f64) * (task.duration_minutes as f64) / 10.0;
    let base = effort.round().max(1.0) as u32;

    let multiplier = energy_multiplier(morning_energy);
    let low_energy_bonus = multiplier > 1.0;
    let points = if low_energy_bonus {
        (base as f64 * multiplier).round() as u32
    } else {
        base
    };

    PointsAward {
        base,
        points,
        low_energy_bonus,
        multiplier,
    }
}

/// One append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub points: u32,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl PointsTransaction {
    pub fn new(points: u32, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            points,
            reason: reason.into(),
            timestamp,
        }
    }

    pub fn completion(task: &Task, award: &PointsAward, timestamp: DateTime<Utc>) -> Self {
        let reason = if award.low_energy_bonus {
            format!("completed: {} (x{} low-energy bonus)", task.name, award.multiplier)
        } else {
            format!("completed: {}", task.name)
        };
        Self::new(award.points, reason, timestamp)
    }

    pub fn feedback(task: &Task, timestamp: DateTime<Utc>) -> Self {
        Self::new(FEEDBACK_POINTS, format!("feedback: {}", task.name), timestamp)
    }

    pub fn perfect_day(timestamp: DateTime<Utc>) -> Self {
        Self::new(PERFECT_DAY_BONUS, "perfect day", timestamp)
    }
}

pub fn total_points(ledger: &[PointsTransaction]) -> u64 {
    ledger.iter().map(|t| t.points as u64).sum()
}

/// Completion of the *planned* items for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    pub planned: usize,
    pub completed: usize,
}

impl DayProgress {
    /// Counts planned ids that also appear in `completed`.
    pub fn new<'a>(
        planned: impl IntoIterator<Item = &'a str>,
        completed: &[String],
    ) -> Self {
        let mut p = 0;
        let mut c = 0;
        for id in planned {
            p += 1;
            if completed.iter().any(|d| d == id) {
                c += 1;
            }
        }
        Self {
            planned: p,
            completed: c,
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.planned == 0 {
            return 0.0;
        }
        self.completed as f64 / self.planned as f64
    }

    /// An empty plan is never a perfect day.
    pub fn is_perfect(&self) -> bool {
        self.planned > 0 && self.completed == self.planned
    }
}

/// The perfect-day bonus, unless it was already granted today.
pub fn perfect_day_bonus(progress: &DayProgress, already_awarded: bool) -> Option<u32> {
    (progress.is_perfect() && !already_awarded).then_some(PERFECT_DAY_BONUS)
}
