//! Daily loop: check in, view the plan, tick tasks off, review actuals.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use dayplan_core::{
    build_day_plan, calc_points, perfect_day_bonus, total_points, validate_tasks, AlertLevel,
    DayPlan, DayProgress, MorningContext, PointsAward, PointsTransaction, SleepQuality, Task,
};
use std::fmt::Write as _;
use tracing::{debug, info};

use crate::config::Config;
use crate::state::{DayState, Store};

/// Answer the three morning questions and build today's plan.
///
/// A new calendar day clears yesterday's completion flags first. Checking
/// in again on the same day replans but keeps what was already done.
pub fn checkin(
    store: &Store,
    cfg: &Config,
    sleep: SleepQuality,
    energy: i32,
    hours: Option<f64>,
    now: DateTime<Utc>,
) -> Result<DayState> {
    let today = cfg.today(now)?;
    let ctx = MorningContext::new(sleep, hours.unwrap_or(cfg.checkin.default_hours), energy);
    ctx.validate()?;

    let tasks = store.load_tasks()?;
    validate_tasks(&tasks).context("tasks.json is invalid")?;

    let mut history = store.load_learned()?;
    let previous = store.load_day()?.filter(|d| d.date == today);
    if previous.is_none() {
        info!(%today, "starting a new day");
        history.start_new_day();
        store.save_learned(&history)?;
    }

    let plan = build_day_plan(&tasks, &ctx, &history, today);
    let mut state = DayState::new(today, ctx, plan);
    if let Some(prev) = previous {
        state.completed = prev.completed;
        state.feedback_given = prev.feedback_given;
        state.perfect_day_awarded = prev.perfect_day_awarded;
    }
    store.save_day(&state)?;
    Ok(state)
}

fn today_state(store: &Store, today: NaiveDate) -> Result<DayState> {
    match store.load_day()? {
        Some(day) if day.date == today => Ok(day),
        _ => bail!("No check-in for {today}. Run: dayplan checkin --sleep <quality> --energy <1-10>"),
    }
}

fn find_task(store: &Store, task_id: &str) -> Result<Task> {
    store
        .load_tasks()?
        .into_iter()
        .find(|t| t.id == task_id)
        .with_context(|| format!("unknown task id '{task_id}'"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task: Task,
    pub award: PointsAward,
    pub progress: DayProgress,
    pub perfect_day_bonus: Option<u32>,
}

/// Mark a task done: award points at the morning's energy and check for
/// a perfect day.
pub fn complete(store: &Store, cfg: &Config, task_id: &str, now: DateTime<Utc>) -> Result<Completion> {
    let today = cfg.today(now)?;
    let mut state = today_state(store, today)?;
    if state.is_completed(task_id) {
        bail!("'{task_id}' is already marked done today");
    }
    let task = find_task(store, task_id)?;

    let award = calc_points(&task, state.context.energy);

    let mut history = store.load_learned()?;
    history.mark_completed(task_id, today);
    store.save_learned(&history)?;

    state.completed.push(task_id.to_string());
    let progress = DayProgress::new(state.plan.planned_ids(), &state.completed);
    let bonus = perfect_day_bonus(&progress, state.perfect_day_awarded);
    if bonus.is_some() {
        state.perfect_day_awarded = true;
    }
    // today.json is written before any ledger entry.
    store.save_day(&state)?;

    store.append_ledger(&PointsTransaction::completion(&task, &award, now))?;
    if bonus.is_some() {
        store.append_ledger(&PointsTransaction::perfect_day(now))?;
        info!(%today, "perfect day");
    }

    debug!(task_id, points = award.points, "completion recorded");
    Ok(Completion {
        task,
        award,
        progress,
        perfect_day_bonus: bonus,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub task: Task,
    pub count: u32,
    pub avg_duration_minutes: i32,
    pub avg_energy: f64,
    pub feedback_points: Option<u32>,
}

/// Log actual minutes/energy for a task and fold them into its history.
pub fn review(
    store: &Store,
    cfg: &Config,
    task_id: &str,
    minutes: Option<i32>,
    energy: Option<f64>,
    now: DateTime<Utc>,
) -> Result<Review> {
    if let Some(m) = minutes {
        if m < 1 {
            bail!("--minutes must be at least 1");
        }
    }
    if let Some(e) = energy {
        if !(1.0..=10.0).contains(&e) {
            bail!("--energy must be 1..=10");
        }
    }

    let today = cfg.today(now)?;
    let mut state = today_state(store, today)?;
    let task = find_task(store, task_id)?;

    let mut history = store.load_learned()?;
    let rec = history.record_review(task_id, minutes, energy, today).clone();
    store.save_learned(&history)?;

    let logged_actuals = minutes.is_some() || energy.is_some();
    let feedback_points = if logged_actuals && !state.feedback_given.iter().any(|id| id == task_id) {
        let txn = PointsTransaction::feedback(&task, now);
        state.feedback_given.push(task_id.to_string());
        store.save_day(&state)?;
        store.append_ledger(&txn)?;
        Some(txn.points)
    } else {
        None
    };

    Ok(Review {
        task,
        count: rec.count,
        avg_duration_minutes: rec.avg_duration_minutes,
        avg_energy: rec.avg_energy,
        feedback_points,
    })
}

pub fn render_plan(plan: &DayPlan, completed: &[String]) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "# Plan: {} of {} min{}\n",
        plan.minutes_used,
        plan.available_minutes,
        match plan.overflow_minutes() {
            0 => String::new(),
            over => format!(" ({over} min over)"),
        }
    );

    for alert in &plan.alerts {
        let tag = match alert.level {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warn",
            AlertLevel::Error => "ERROR",
        };
        let _ = writeln!(s, "[{tag}] {}", alert.message);
    }
    if !plan.alerts.is_empty() {
        s.push('\n');
    }

    if plan.plan.is_empty() {
        s.push_str("(nothing planned)\n");
    }
    for item in &plan.plan {
        let mark = if completed.iter().any(|id| id == &item.task.id) { "x" } else { " " };
        let mut flags = Vec::new();
        if item.pinned {
            flags.push("pinned");
        }
        if item.compressed {
            flags.push("compressed");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        let _ = writeln!(
            s,
            "- [{mark}] {} | {} min | score {:.1} | {}{flags}",
            item.display_name, item.scheduled_duration, item.score, item.task.id
        );
        for sub in &item.task.subtasks {
            let _ = writeln!(s, "    - {sub}");
        }
    }

    if !plan.blocked.is_empty() {
        s.push_str("\n## Blocked today\n");
        for b in &plan.blocked {
            let _ = writeln!(s, "- {} (waiting on: {})", b.task.name, b.blocked_by.join(", "));
        }
    }
    s
}

pub fn show_plan(store: &Store, cfg: &Config, now: DateTime<Utc>) -> Result<()> {
    let state = today_state(store, cfg.today(now)?)?;
    let progress = DayProgress::new(state.plan.planned_ids(), &state.completed);
    print!("{}", render_plan(&state.plan, &state.completed));
    println!(
        "\nDone {}/{} ({:.0}%)",
        progress.completed,
        progress.planned,
        progress.fraction() * 100.0
    );
    Ok(())
}

pub fn show_points(store: &Store, limit: usize) -> Result<()> {
    let ledger = store.read_ledger()?;
    println!("Total points: {}", total_points(&ledger));
    for txn in ledger.iter().rev().take(limit) {
        println!(
            "{} | +{} | {}",
            txn.timestamp.format("%Y-%m-%d %H:%M"),
            txn.points,
            txn.reason
        );
    }
    Ok(())
}
