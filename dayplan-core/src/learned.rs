//! Learned history: per-task running averages from reported actuals.
//!
//! Averages are a plain streaming mean. Old samples weigh as much as new
//! ones; there is no decay and no outlier rejection.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedRecord {
    pub count: u32,
    /// Whole minutes; 0 until the first actual duration is logged.
    pub avg_duration_minutes: i32,
    /// One decimal place; 0.0 until the first actual energy is logged.
    pub avg_energy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_done_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_today: bool,
}

impl LearnedRecord {
    /// Learned duration, if one has been observed.
    pub fn duration(&self) -> Option<i32> {
        (self.avg_duration_minutes > 0).then_some(self.avg_duration_minutes)
    }

    /// Learned energy, if one has been observed.
    pub fn energy(&self) -> Option<f64> {
        (self.avg_energy > 0.0).then_some(self.avg_energy)
    }
}

/// Fold one review into a record, returning the updated copy.
///
/// `count` grows on every review, with or without actuals.
pub fn apply_review(
    prior: Option<&LearnedRecord>,
    actual_duration_minutes: Option<i32>,
    actual_energy: Option<f64>,
    completed: NaiveDate,
) -> LearnedRecord {
    let prior = prior.cloned().unwrap_or_default();
    let n = prior.count as f64;
    let count = prior.count + 1;
    let next_n = count as f64;

    let avg_duration_minutes = match actual_duration_minutes {
        Some(actual) => {
            ((prior.avg_duration_minutes as f64 * n + actual as f64) / next_n).round() as i32
        }
        None => prior.avg_duration_minutes,
    };

    let avg_energy = match actual_energy {
        Some(actual) => round1((prior.avg_energy * n + actual) / next_n),
        None => prior.avg_energy,
    };

    LearnedRecord {
        count,
        avg_duration_minutes,
        avg_energy,
        last_done_date: Some(completed),
        completed_today: true,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// The learned-history store contents, keyed by task id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnedHistory {
    records: BTreeMap<String, LearnedRecord>,
}

impl LearnedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&LearnedRecord> {
        self.records.get(task_id)
    }

    pub fn insert(&mut self, task_id: impl Into<String>, record: LearnedRecord) {
        self.records.insert(task_id.into(), record);
    }

    pub fn completed_today(&self, task_id: &str) -> bool {
        self.get(task_id).is_some_and(|r| r.completed_today)
    }

    /// Apply a review and store the result.
    pub fn record_review(
        &mut self,
        task_id: &str,
        actual_duration_minutes: Option<i32>,
        actual_energy: Option<f64>,
        completed: NaiveDate,
    ) -> &LearnedRecord {
        let updated = apply_review(
            self.get(task_id),
            actual_duration_minutes,
            actual_energy,
            completed,
        );
        debug!(
            task_id,
            count = updated.count,
            avg_duration = updated.avg_duration_minutes,
            avg_energy = updated.avg_energy,
            "review folded into history"
        );
        self.records.insert(task_id.to_string(), updated);
        &self.records[task_id]
    }

    /// Tick a task off without logging actuals. Averages are untouched.
    pub fn mark_completed(&mut self, task_id: &str, completed: NaiveDate) {
        let rec = self.records.entry(task_id.to_string()).or_default();
        rec.completed_today = true;
        rec.last_done_date = Some(completed);
    }

    /// Clear every `completed_today` flag. Call once per new planning day.
    pub fn start_new_day(&mut self) {
        for rec in self.records.values_mut() {
            rec.completed_today = false;
        }
    }
}
