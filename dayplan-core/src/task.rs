//! Task model for the daily planner.
//!
//! Tasks are templates: a recurring chore or a one-off errand. They carry
//! no behavior beyond validation; scoring and allocation live elsewhere.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Informational grouping. The scheduler never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Health,
    Home,
    Work,
    Errands,
    Social,
    Learning,
    #[default]
    Other,
}

/// How often a task is expected to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "2x_daily")]
    TwiceDaily,
    #[serde(rename = "3x_weekly")]
    ThriceWeekly,
    #[serde(rename = "2x_weekly")]
    TwiceWeekly,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "biweekly")]
    Biweekly,
    #[serde(rename = "monthly")]
    Monthly,
    #[default]
    #[serde(rename = "once")]
    Once,
}

impl Frequency {
    /// Expected number of days between two completions.
    ///
    /// `None` for one-off tasks: they never become overdue by cadence.
    pub fn expected_interval_days(&self) -> Option<i64> {
        match self {
            Frequency::Daily | Frequency::TwiceDaily => Some(1),
            Frequency::ThriceWeekly => Some(2),
            Frequency::TwiceWeekly => Some(3),
            Frequency::Weekly => Some(7),
            Frequency::Biweekly => Some(14),
            Frequency::Monthly => Some(30),
            Frequency::Once => None,
        }
    }
}

/// Informational only; the scheduler does not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    #[default]
    Anytime,
}

/// Weekday code as stored in task records ("mon", "tue", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayCode {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl From<Weekday> for DayCode {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayCode::Mon,
            Weekday::Tue => DayCode::Tue,
            Weekday::Wed => DayCode::Wed,
            Weekday::Thu => DayCode::Thu,
            Weekday::Fri => DayCode::Fri,
            Weekday::Sat => DayCode::Sat,
            Weekday::Sun => DayCode::Sun,
        }
    }
}

/// A lighter or shorter way to perform a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    pub duration_minutes: i32,
    pub energy_required: i32,
}

impl Variant {
    pub fn new(name: impl Into<String>, duration_minutes: i32, energy_required: i32) -> Self {
        Self {
            name: name.into(),
            duration_minutes,
            energy_required,
        }
    }
}

/// Core task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub critical: bool,

    #[serde(default)]
    pub category: Category,

    /// 1-10 nominal effort.
    pub energy_required: i32,

    /// Nominal minutes, at least 1.
    pub duration_minutes: i32,

    #[serde(default)]
    pub frequency: Frequency,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,

    #[serde(default)]
    pub time_of_day: TimeOfDay,

    /// Empty means every day.
    #[serde(default)]
    pub days_available: Vec<DayCode>,

    #[serde(default)]
    pub variants: Vec<Variant>,

    #[serde(default)]
    pub subtasks: Vec<String>,

    /// Ids of tasks that must be completed today before this one.
    #[serde(default)]
    pub blockers: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mandatory: false,
            critical: false,
            category: Category::Other,
            energy_required: 5,
            duration_minutes: 30,
            frequency: Frequency::Once,
            deadline: None,
            time_of_day: TimeOfDay::Anytime,
            days_available: Vec::new(),
            variants: Vec::new(),
            subtasks: Vec::new(),
            blockers: Vec::new(),
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn with_duration(mut self, minutes: i32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_energy(mut self, energy_required: i32) -> Self {
        self.energy_required = energy_required;
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_days(mut self, days: &[DayCode]) -> Self {
        self.days_available = days.to_vec();
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn with_blocker(mut self, task_id: impl Into<String>) -> Self {
        self.blockers.push(task_id.into());
        self
    }

    /// Whether the task exists on the given weekday.
    pub fn available_on(&self, day: Weekday) -> bool {
        self.days_available.is_empty() || self.days_available.contains(&DayCode::from(day))
    }

    /// The shortest listed variant. Ties keep list order.
    pub fn shortest_variant(&self) -> Option<&Variant> {
        self.variants
            .iter()
            .reduce(|best, v| if v.duration_minutes < best.duration_minutes { v } else { best })
    }

    /// Reject records the scheduler cannot reason about.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.id.trim().is_empty() {
            return Err(TaskError::MissingId);
        }
        if self.name.trim().is_empty() {
            return Err(TaskError::MissingName { id: self.id.clone() });
        }
        if self.duration_minutes < 1 {
            return Err(TaskError::NonPositiveDuration {
                id: self.id.clone(),
                minutes: self.duration_minutes,
            });
        }
        if !(1..=10).contains(&self.energy_required) {
            return Err(TaskError::EnergyOutOfRange {
                id: self.id.clone(),
                energy: self.energy_required,
            });
        }
        for v in &self.variants {
            if v.duration_minutes < 0 {
                return Err(TaskError::NegativeVariantDuration {
                    id: self.id.clone(),
                    variant: v.name.clone(),
                });
            }
            if !(1..=10).contains(&v.energy_required) {
                return Err(TaskError::EnergyOutOfRange {
                    id: self.id.clone(),
                    energy: v.energy_required,
                });
            }
        }
        if self.blockers.iter().any(|b| b == &self.id) {
            return Err(TaskError::SelfBlocking { id: self.id.clone() });
        }
        Ok(())
    }
}

/// Validate a whole task source, including id uniqueness.
pub fn validate_tasks(tasks: &[Task]) -> Result<(), TaskError> {
    let mut seen = std::collections::HashSet::new();
    for t in tasks {
        t.validate()?;
        if !seen.insert(t.id.as_str()) {
            return Err(TaskError::DuplicateId { id: t.id.clone() });
        }
    }
    Ok(())
}
