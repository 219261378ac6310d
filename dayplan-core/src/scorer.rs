//! Task scoring: how much a task deserves a slot today.
//!
//! score = urgency + criticality + energy fit + overdue bonus
//!
//! - urgency: deadline bands, 0..=30
//! - criticality: mandatory 25, critical 15
//! - energy fit: up to 20 for a perfect energy match, inflated after bad sleep
//! - overdue: up to 15 once a recurring task slips past its cadence

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::context::MorningContext;
use crate::learned::LearnedHistory;
use crate::task::Task;

/// A task that exists today, with its score broken down.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTask {
    pub task: Task,
    pub score: f64,
    pub urgency: f64,
    pub criticality: f64,
    pub energy_fit: f64,
    pub overdue_points: f64,
    pub effective_duration: i32,
    pub effective_energy: f64,
    /// Blockers not yet completed today. Non-empty means the task is blocked.
    pub blocked_by: Vec<String>,
}

impl ScoredTask {
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    /// Shortest this task can get: nominal or its shortest variant.
    pub fn min_duration(&self) -> i32 {
        self.task
            .shortest_variant()
            .map(|v| v.duration_minutes.min(self.effective_duration))
            .unwrap_or(self.effective_duration)
    }
}

pub fn urgency_points(deadline: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let Some(deadline) = deadline else {
        return 0.0;
    };
    match (deadline - today).num_days() {
        d if d <= 0 => 30.0,
        1 => 28.0,
        d if d <= 3 => 22.0,
        d if d <= 7 => 16.0,
        d if d <= 14 => 10.0,
        d if d <= 30 => 5.0,
        _ => 1.0,
    }
}

pub fn criticality_points(task: &Task) -> f64 {
    if task.mandatory {
        25.0
    } else if task.critical {
        15.0
    } else {
        0.0
    }
}

/// Worse sleep weighs energy fit more heavily.
pub fn sleep_multiplier(ctx: &MorningContext) -> f64 {
    1.0 + (5 - ctx.sleep.score()) as f64 * 0.1
}

pub fn energy_fit_points(ctx: &MorningContext, effective_energy: f64) -> f64 {
    let gap = (ctx.energy as f64 - effective_energy).abs();
    (20.0 - gap * 2.5).max(0.0) * sleep_multiplier(ctx)
}

pub fn overdue_points(task: &Task, last_done: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let (Some(last_done), Some(interval)) = (last_done, task.frequency.expected_interval_days())
    else {
        return 0.0;
    };
    let since = (today - last_done).num_days();
    if since <= interval {
        return 0.0;
    }
    let overshoot = (since - interval) as f64;
    (overshoot / interval as f64 * 15.0).min(15.0)
}

/// Score a task for `today`. `None` when the task is not available today.
pub fn score_task(
    task: &Task,
    ctx: &MorningContext,
    history: &LearnedHistory,
    today: NaiveDate,
) -> Option<ScoredTask> {
    if !task.available_on(today.weekday()) {
        return None;
    }

    let learned = history.get(&task.id);
    let effective_duration = learned
        .and_then(|r| r.duration())
        .unwrap_or(task.duration_minutes);
    let effective_energy = learned
        .and_then(|r| r.energy())
        .unwrap_or(task.energy_required as f64);

    let urgency = urgency_points(task.deadline, today);
    let criticality = criticality_points(task);
    let energy_fit = energy_fit_points(ctx, effective_energy);
    let overdue = overdue_points(task, learned.and_then(|r| r.last_done_date), today);

    let blocked_by: Vec<String> = task
        .blockers
        .iter()
        .filter(|b| !history.completed_today(b))
        .cloned()
        .collect();

    let score = if blocked_by.is_empty() {
        urgency + criticality + energy_fit + overdue
    } else {
        0.0
    };

    Some(ScoredTask {
        task: task.clone(),
        score,
        urgency,
        criticality,
        energy_fit,
        overdue_points: overdue,
        effective_duration,
        effective_energy,
        blocked_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SleepQuality;
    use crate::learned::LearnedRecord;
    use crate::task::{DayCode, Frequency, Variant};

    // 2026-03-02 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn ctx(energy: i32, sleep: SleepQuality) -> MorningContext {
        MorningContext::new(sleep, 8.0, energy)
    }

    #[test]
    fn unavailable_weekday_is_excluded() {
        let t = Task::new("t", "Weekend only").with_days(&[DayCode::Sat, DayCode::Sun]);
        assert!(score_task(&t, &ctx(5, SleepQuality::Ok), &LearnedHistory::new(), monday()).is_none());

        let t = t.with_days(&[DayCode::Mon]);
        assert!(score_task(&t, &ctx(5, SleepQuality::Ok), &LearnedHistory::new(), monday()).is_some());
    }

    #[test]
    fn urgency_bands() {
        let today = monday();
        let at = |days: i64| urgency_points(Some(today + chrono::Duration::days(days)), today);
        assert_eq!(at(-3), 30.0);
        assert_eq!(at(0), 30.0);
        assert_eq!(at(1), 28.0);
        assert_eq!(at(3), 22.0);
        assert_eq!(at(7), 16.0);
        assert_eq!(at(14), 10.0);
        assert_eq!(at(30), 5.0);
        assert_eq!(at(31), 1.0);
        assert_eq!(urgency_points(None, today), 0.0);
    }

    #[test]
    fn perfect_match_on_ok_sleep_scores_twenty() {
        let t = Task::new("t", "t").with_energy(6);
        let s = score_task(&t, &ctx(6, SleepQuality::Ok), &LearnedHistory::new(), monday()).unwrap();
        assert_eq!(s.energy_fit, 20.0);
        assert_eq!(s.score, 20.0);
    }

    #[test]
    fn bad_sleep_inflates_energy_fit() {
        let t = Task::new("t", "t").with_energy(4);
        let terrible = score_task(&t, &ctx(4, SleepQuality::Terrible), &LearnedHistory::new(), monday()).unwrap();
        let great = score_task(&t, &ctx(4, SleepQuality::Great), &LearnedHistory::new(), monday()).unwrap();
        assert!((terrible.energy_fit - 28.0).abs() < 1e-9);
        assert!((great.energy_fit - 12.0).abs() < 1e-9);
    }

    #[test]
    fn energy_fit_never_negative() {
        let t = Task::new("t", "t").with_energy(10);
        let s = score_task(&t, &ctx(1, SleepQuality::Ok), &LearnedHistory::new(), monday()).unwrap();
        assert_eq!(s.energy_fit, 0.0);
    }

    #[test]
    fn learned_values_override_nominal() {
        let mut h = LearnedHistory::new();
        h.insert(
            "t",
            LearnedRecord {
                count: 3,
                avg_duration_minutes: 50,
                avg_energy: 7.0,
                ..Default::default()
            },
        );
        let t = Task::new("t", "t").with_duration(30).with_energy(4);
        let s = score_task(&t, &ctx(7, SleepQuality::Ok), &h, monday()).unwrap();
        assert_eq!(s.effective_duration, 50);
        assert_eq!(s.effective_energy, 7.0);
        assert_eq!(s.energy_fit, 20.0);
    }

    #[test]
    fn criticality_and_overdue() {
        let today = monday();
        let mut h = LearnedHistory::new();
        h.mark_completed("w", today - chrono::Duration::days(14));
        h.start_new_day();

        let t = Task::new("w", "Weekly review")
            .critical()
            .with_frequency(Frequency::Weekly)
            .with_energy(5);
        let s = score_task(&t, &ctx(5, SleepQuality::Ok), &h, today).unwrap();
        assert_eq!(s.criticality, 15.0);
        // 7 days over a 7 day cadence caps at 15.
        assert_eq!(s.overdue_points, 15.0);
        assert_eq!(s.score, 15.0 + 20.0 + 15.0);

        let partial = overdue_points(&t, Some(today - chrono::Duration::days(9)), today);
        assert!((partial - 2.0 / 7.0 * 15.0).abs() < 1e-9);
        assert_eq!(overdue_points(&t, Some(today - chrono::Duration::days(7)), today), 0.0);

        let once = Task::new("o", "o");
        assert_eq!(overdue_points(&once, Some(today - chrono::Duration::days(400)), today), 0.0);
        assert_eq!(criticality_points(&Task::new("m", "m").mandatory().critical()), 25.0);
    }

    #[test]
    fn blocked_until_blocker_completed_today() {
        let today = monday();
        let t = Task::new("cook", "Cook").with_blocker("shop");
        let mut h = LearnedHistory::new();

        let s = score_task(&t, &ctx(5, SleepQuality::Ok), &h, today).unwrap();
        assert!(s.is_blocked());
        assert_eq!(s.score, 0.0);
        assert_eq!(s.blocked_by, vec!["shop".to_string()]);

        h.mark_completed("shop", today);
        let s = score_task(&t, &ctx(5, SleepQuality::Ok), &h, today).unwrap();
        assert!(!s.is_blocked());
        assert!(s.score > 0.0);
    }

    #[test]
    fn min_duration_uses_shorter_of_nominal_and_variant() {
        let t = Task::new("t", "t")
            .with_duration(20)
            .with_variant(Variant::new("long", 40, 5))
            .with_variant(Variant::new("short", 25, 3));
        let s = score_task(&t, &ctx(5, SleepQuality::Ok), &LearnedHistory::new(), monday()).unwrap();
        assert_eq!(s.min_duration(), 20);
    }
}
