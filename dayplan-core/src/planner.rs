//! Day plan builder: turns the task backlog into today's time-boxed plan.
//!
//! Three tiers are allocated in order:
//! 1) mandatory: always admitted, even past the budget
//! 2) critical: admitted within the budget plus a 15 minute grace band,
//!    switching to shorter variants when the nominal total does not fit
//! 3) normal: admitted only if they fit exactly in what is left
//!
//! The plan keeps tier order; scores only order tasks within a tier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::MorningContext;
use crate::learned::LearnedHistory;
use crate::points::energy_multiplier;
use crate::scorer::{score_task, ScoredTask};
use crate::task::{Task, Variant};
use crate::variant::pick_variant;

/// Overflow tolerated for critical-tier admission.
pub const GRACE_MINUTES: i32 = 15;

/// Normal-tier tasks switch to shorter variants past this utilization.
const NORMAL_PRESSURE_UTILIZATION: f64 = 0.9;

/// Overdue bonus above which a task counts as auto-promoted.
const PROMOTED_OVERDUE_POINTS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Info,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Mandatory,
    Critical,
    Normal,
}

impl Tier {
    fn of(task: &Task) -> Self {
        if task.mandatory {
            Tier::Mandatory
        } else if task.critical {
            Tier::Critical
        } else {
            Tier::Normal
        }
    }
}

/// A task placed into today's plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    pub task: Task,
    pub tier: Tier,
    pub scheduled_duration: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    pub display_name: String,
    pub score: f64,
    /// Mandatory items; never dropped.
    pub pinned: bool,
    /// A shorter variant was substituted because of time pressure.
    pub compressed: bool,
}

impl ScheduledItem {
    fn new(scored: &ScoredTask, tier: Tier, variant: Option<&Variant>, pressure: bool) -> Self {
        let scheduled_duration = variant
            .map(|v| v.duration_minutes)
            .unwrap_or(scored.effective_duration);
        let display_name = match variant {
            Some(v) => format!("{} ({})", scored.task.name, v.name),
            None => scored.task.name.clone(),
        };
        Self {
            task: scored.task.clone(),
            tier,
            scheduled_duration,
            variant: variant.cloned(),
            display_name,
            score: scored.score,
            pinned: tier == Tier::Mandatory,
            compressed: pressure && scheduled_duration < scored.effective_duration,
        }
    }
}

/// A task held back because its blockers are not done yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTask {
    pub task: Task,
    pub blocked_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub plan: Vec<ScheduledItem>,
    pub alerts: Vec<Alert>,
    pub minutes_used: i32,
    pub available_minutes: i32,
    pub blocked: Vec<BlockedTask>,
}

impl DayPlan {
    pub fn tier_counts(&self) -> (usize, usize, usize) {
        self.plan.iter().fold((0, 0, 0), |(m, c, n), item| match item.tier {
            Tier::Mandatory => (m + 1, c, n),
            Tier::Critical => (m, c + 1, n),
            Tier::Normal => (m, c, n + 1),
        })
    }

    pub fn overflow_minutes(&self) -> i32 {
        self.minutes_used.saturating_sub(self.available_minutes).max(0)
    }

    pub fn planned_ids(&self) -> impl Iterator<Item = &str> {
        self.plan.iter().map(|i| i.task.id.as_str())
    }

    pub fn item(&self, task_id: &str) -> Option<&ScheduledItem> {
        self.plan.iter().find(|i| i.task.id == task_id)
    }

    pub fn has_errors(&self) -> bool {
        self.alerts.iter().any(|a| a.level == AlertLevel::Error)
    }
}

/// Highest score first; task id breaks ties so the order never depends
/// on how the task source happened to enumerate records.
fn by_score_desc(a: &ScoredTask, b: &ScoredTask) -> std::cmp::Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.task.id.cmp(&b.task.id))
}

pub fn build_day_plan(
    tasks: &[Task],
    ctx: &MorningContext,
    history: &LearnedHistory,
    today: NaiveDate,
) -> DayPlan {
    let available_minutes = ctx.available_minutes();
    let mut alerts = Vec::new();
    let mut blocked = Vec::new();

    let mut mandatory = Vec::new();
    let mut critical = Vec::new();
    let mut normal = Vec::new();
    let mut promoted = Vec::new();

    for task in tasks {
        let Some(scored) = score_task(task, ctx, history, today) else {
            debug!(task_id = %task.id, "not available today");
            continue;
        };
        if scored.overdue_points > PROMOTED_OVERDUE_POINTS {
            promoted.push(scored.task.name.clone());
        }
        if scored.is_blocked() {
            blocked.push(BlockedTask {
                task: scored.task,
                blocked_by: scored.blocked_by,
            });
            continue;
        }
        match Tier::of(task) {
            Tier::Mandatory => mandatory.push(scored),
            Tier::Critical => critical.push(scored),
            Tier::Normal => normal.push(scored),
        }
    }

    mandatory.sort_by(by_score_desc);
    critical.sort_by(by_score_desc);
    normal.sort_by(by_score_desc);

    // Minute totals saturate: a validated backlog can still sum past i32.
    let mut plan = Vec::new();
    let mut minutes_used: i32 = 0;

    for scored in &mandatory {
        let remaining = available_minutes.saturating_sub(minutes_used);
        let variant = pick_variant(&scored.task, ctx.energy, ctx.sleep, remaining, false);
        let item = ScheduledItem::new(scored, Tier::Mandatory, variant, false);
        minutes_used = minutes_used.saturating_add(item.scheduled_duration);
        debug!(task_id = %scored.task.id, minutes = item.scheduled_duration, "pinned mandatory task");
        plan.push(item);
    }

    if available_minutes <= 0 {
        let skipped = critical.len() + normal.len();
        if skipped > 0 {
            warn!(skipped, "no time available; only mandatory tasks planned");
            alerts.push(Alert::error(format!(
                "No time available today: {skipped} non-mandatory task(s) skipped"
            )));
        }
    } else {
        allocate_critical(&critical, ctx, available_minutes, &mut minutes_used, &mut plan, &mut alerts);
        allocate_normal(&normal, ctx, available_minutes, &mut minutes_used, &mut plan);
    }

    if !promoted.is_empty() {
        alerts.push(Alert::info(format!(
            "Overdue tasks auto-promoted: {}",
            promoted.join(", ")
        )));
    }

    if ctx.is_low_energy() {
        alerts.push(Alert::info(format!(
            "Low-energy bonus active: lighter variants preferred, points x{}",
            energy_multiplier(ctx.energy)
        )));
    }

    info!(
        planned = plan.len(),
        blocked = blocked.len(),
        minutes_used,
        available_minutes,
        "day plan built"
    );

    DayPlan {
        plan,
        alerts,
        minutes_used,
        available_minutes,
        blocked,
    }
}

fn allocate_critical(
    critical: &[ScoredTask],
    ctx: &MorningContext,
    available_minutes: i32,
    minutes_used: &mut i32,
    plan: &mut Vec<ScheduledItem>,
    alerts: &mut Vec<Alert>,
) {
    if critical.is_empty() {
        return;
    }

    let budget = available_minutes.saturating_sub(*minutes_used);
    let nominal_total = critical
        .iter()
        .map(|s| s.effective_duration)
        .fold(0, i32::saturating_add);
    let compressed_total = critical
        .iter()
        .map(ScoredTask::min_duration)
        .fold(0, i32::saturating_add);
    let time_pressure = nominal_total > budget;

    if time_pressure {
        if compressed_total <= budget {
            warn!(nominal_total, compressed_total, budget, "time pressure on critical tasks");
            alerts.push(Alert::warning(format!(
                "Critical tasks need {nominal_total} min but only {budget} min are left; switching to shorter variants"
            )));
        } else {
            let shortfall = compressed_total.saturating_sub(budget);
            warn!(compressed_total, budget, shortfall, "critical tasks do not fit even compressed");
            alerts.push(Alert::error(format!(
                "Critical tasks are {shortfall} min short even with shorter variants"
            )));
        }
    }

    let ceiling = available_minutes.saturating_add(GRACE_MINUTES);
    for scored in critical {
        let remaining = available_minutes.saturating_sub(*minutes_used);
        let variant = pick_variant(&scored.task, ctx.energy, ctx.sleep, remaining, time_pressure);
        let item = ScheduledItem::new(scored, Tier::Critical, variant, time_pressure);

        if minutes_used.saturating_add(item.scheduled_duration) <= ceiling {
            *minutes_used = minutes_used.saturating_add(item.scheduled_duration);
            debug!(
                task_id = %scored.task.id,
                minutes = item.scheduled_duration,
                compressed = item.compressed,
                "admitted critical task"
            );
            plan.push(item);
        } else {
            debug!(task_id = %scored.task.id, minutes = item.scheduled_duration, "critical task does not fit");
        }
    }
}

fn allocate_normal(
    normal: &[ScoredTask],
    ctx: &MorningContext,
    available_minutes: i32,
    minutes_used: &mut i32,
    plan: &mut Vec<ScheduledItem>,
) {
    for scored in normal {
        if *minutes_used >= available_minutes {
            break;
        }
        let remaining = available_minutes.saturating_sub(*minutes_used);
        let pressure = *minutes_used as f64 > available_minutes as f64 * NORMAL_PRESSURE_UTILIZATION;
        let variant = pick_variant(&scored.task, ctx.energy, ctx.sleep, remaining, pressure);
        let item = ScheduledItem::new(scored, Tier::Normal, variant, pressure);

        if item.scheduled_duration <= remaining {
            *minutes_used = minutes_used.saturating_add(item.scheduled_duration);
            debug!(task_id = %scored.task.id, minutes = item.scheduled_duration, "admitted task");
            plan.push(item);
        } else {
            debug!(task_id = %scored.task.id, minutes = item.scheduled_duration, remaining, "task does not fit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SleepQuality;
    use crate::task::DayCode;

    // 2026-03-02 is a Monday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn ctx(hours: f64) -> MorningContext {
        MorningContext::new(SleepQuality::Ok, hours, 5)
    }

    fn ids(plan: &DayPlan) -> Vec<&str> {
        plan.planned_ids().collect()
    }

    #[test]
    fn tiers_keep_their_order() {
        let tasks = vec![
            Task::new("n", "Normal").with_duration(10).with_deadline(today()),
            Task::new("c", "Critical").critical().with_duration(10),
            Task::new("m", "Mandatory").mandatory().with_duration(10),
        ];
        let plan = build_day_plan(&tasks, &ctx(2.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["m", "c", "n"]);
        assert_eq!(plan.minutes_used, 30);
        assert_eq!(plan.available_minutes, 120);
        assert_eq!(plan.tier_counts(), (1, 1, 1));
        assert!(plan.plan[0].pinned);
        assert!(!plan.plan[1].pinned);
    }

    #[test]
    fn within_tier_sorted_by_score_then_id() {
        let tasks = vec![
            Task::new("b", "B").with_duration(10),
            Task::new("a", "A").with_duration(10),
            Task::new("urgent", "Urgent").with_duration(10).with_deadline(today()),
        ];
        let plan = build_day_plan(&tasks, &ctx(2.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["urgent", "a", "b"]);
    }

    #[test]
    fn mandatory_survives_zero_budget() {
        let tasks = vec![
            Task::new("meds", "Meds").mandatory().with_duration(5),
            Task::new("c", "Critical").critical().with_duration(5),
            Task::new("n", "Normal").with_duration(5),
        ];
        let plan = build_day_plan(&tasks, &ctx(0.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["meds"]);
        assert_eq!(plan.minutes_used, 5);
        assert_eq!(plan.overflow_minutes(), 5);
        assert!(plan.has_errors());
    }

    #[test]
    fn critical_grace_band() {
        let tasks = vec![
            Task::new("m", "M").mandatory().with_duration(50),
            Task::new("c", "C").critical().with_duration(20),
        ];
        // 60 available, 50 used, 20 more lands at 70 <= 75.
        let plan = build_day_plan(&tasks, &ctx(1.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["m", "c"]);
        assert_eq!(plan.minutes_used, 70);
        assert!(plan.has_errors());

        let tasks = vec![
            Task::new("m", "M").mandatory().with_duration(50),
            Task::new("c", "C").critical().with_duration(30),
        ];
        let plan = build_day_plan(&tasks, &ctx(1.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["m"]);
    }

    #[test]
    fn normal_tasks_need_an_exact_fit() {
        let tasks = vec![
            Task::new("a", "A").with_duration(50),
            Task::new("b", "B").with_duration(20),
            Task::new("c", "C").with_duration(10),
        ];
        let plan = build_day_plan(&tasks, &ctx(1.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["a", "c"]);
        assert_eq!(plan.minutes_used, 60);
    }

    #[test]
    fn normal_pressure_switches_to_short_variant() {
        let tasks = vec![
            Task::new("a", "A").with_duration(55).with_deadline(today()),
            Task::new("b", "Bake")
                .with_duration(30)
                .with_variant(Variant::new("full", 30, 5))
                .with_variant(Variant::new("quick", 5, 5)),
        ];
        let plan = build_day_plan(&tasks, &ctx(1.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["a", "b"]);
        let b = plan.item("b").unwrap();
        assert_eq!(b.scheduled_duration, 5);
        assert_eq!(b.display_name, "Bake (quick)");
        assert!(b.compressed);
    }

    #[test]
    fn blocked_and_unavailable_tasks_are_separated() {
        let tasks = vec![
            Task::new("shop", "Shop").with_duration(30),
            Task::new("cook", "Cook").with_blocker("shop").with_duration(30),
            Task::new("sun", "Sunday thing").with_days(&[DayCode::Sun]),
        ];
        let plan = build_day_plan(&tasks, &ctx(4.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["shop"]);
        assert_eq!(plan.blocked.len(), 1);
        assert_eq!(plan.blocked[0].task.id, "cook");
        assert_eq!(plan.blocked[0].blocked_by, vec!["shop".to_string()]);
    }

    #[test]
    fn low_energy_alert() {
        let low = MorningContext::new(SleepQuality::Ok, 2.0, 2);
        let plan = build_day_plan(&[], &low, &LearnedHistory::new(), today());
        assert_eq!(plan.alerts.len(), 1);
        assert_eq!(plan.alerts[0].level, AlertLevel::Info);
        assert!(plan.alerts[0].message.contains("Low-energy bonus"));

        let plan = build_day_plan(&[], &ctx(2.0), &LearnedHistory::new(), today());
        assert!(plan.alerts.is_empty());
    }

    #[test]
    fn huge_budget_still_admits_critical_work() {
        let huge = MorningContext::new(SleepQuality::Ok, 1.0e9, 5);
        assert!(huge.validate().is_ok());
        assert_eq!(huge.available_minutes(), i32::MAX);

        let tasks = vec![
            Task::new("c", "Critical").critical().with_duration(10),
            Task::new("n", "Normal").with_duration(10),
        ];
        let plan = build_day_plan(&tasks, &huge, &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["c", "n"]);
        assert_eq!(plan.minutes_used, 20);
        assert_eq!(plan.overflow_minutes(), 0);
    }

    #[test]
    fn oversized_mandatory_tasks_saturate_minutes_used() {
        let big = i32::MAX / 2 + 1;
        let tasks = vec![
            Task::new("a", "A").mandatory().with_duration(big),
            Task::new("b", "B").mandatory().with_duration(big),
            Task::new("n", "Normal").with_duration(10),
        ];
        crate::task::validate_tasks(&tasks).unwrap();

        let plan = build_day_plan(&tasks, &ctx(8.0), &LearnedHistory::new(), today());
        assert_eq!(ids(&plan), vec!["a", "b"]);
        assert_eq!(plan.minutes_used, i32::MAX);
        assert_eq!(plan.overflow_minutes(), i32::MAX - 480);
    }

    #[test]
    fn oversized_critical_totals_report_a_shortfall() {
        let big = i32::MAX / 2 + 1;
        let tasks = vec![
            Task::new("a", "A").critical().with_duration(big),
            Task::new("b", "B").critical().with_duration(big),
        ];
        let plan = build_day_plan(&tasks, &ctx(8.0), &LearnedHistory::new(), today());
        assert!(plan.plan.is_empty());
        assert_eq!(plan.minutes_used, 0);
        let error = plan
            .alerts
            .iter()
            .find(|a| a.level == AlertLevel::Error)
            .unwrap();
        assert!(error.message.contains(&format!("{} min short", i32::MAX - 480)));
    }

    #[test]
    fn blocked_overdue_task_is_still_reported_as_promoted() {
        let mut history = LearnedHistory::new();
        history.record_review("walk", Some(20), None, today() - chrono::Duration::days(10));
        history.start_new_day();

        let tasks = vec![
            Task::new("shoes", "Find shoes").with_duration(5),
            Task::new("walk", "Walk")
                .with_duration(20)
                .with_frequency(crate::task::Frequency::Daily)
                .with_blocker("shoes"),
        ];
        let plan = build_day_plan(&tasks, &ctx(2.0), &history, today());
        assert_eq!(plan.blocked.len(), 1);
        assert_eq!(plan.blocked[0].task.id, "walk");
        assert!(plan.alerts.iter().any(|a| {
            a.level == AlertLevel::Info && a.message == "Overdue tasks auto-promoted: Walk"
        }));
    }

    #[test]
    fn plan_serializes_camel_case() {
        let tasks = vec![Task::new("m", "M").mandatory().with_duration(10)];
        let plan = build_day_plan(&tasks, &ctx(1.0), &LearnedHistory::new(), today());
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"minutesUsed\":10"));
        assert!(json.contains("\"scheduledDuration\":10"));
        assert!(json.contains("\"tier\":\"mandatory\""));
        let back: DayPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
