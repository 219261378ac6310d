//! File-backed store under the dayplan home directory.
//!
//! Layout:
//! - tasks.json     task records
//! - learned.json   task id -> learned record
//! - ledger.jsonl   append-only points transactions
//! - today.json     the current day's check-in, plan and progress

use anyhow::{Context, Result};
use chrono::NaiveDate;
use dayplan_core::{DayPlan, LearnedHistory, MorningContext, PointsTransaction, Task};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub fn dayplan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DAYPLAN_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".dayplan"))
}

/// Everything the app remembers about one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayState {
    pub date: NaiveDate,
    pub context: MorningContext,
    pub plan: DayPlan,
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub feedback_given: Vec<String>,
    #[serde(default)]
    pub perfect_day_awarded: bool,
}

impl DayState {
    pub fn new(date: NaiveDate, context: MorningContext, plan: DayPlan) -> Self {
        Self {
            date,
            context,
            plan,
            completed: Vec::new(),
            feedback_given: Vec::new(),
            perfect_day_awarded: false,
        }
    }

    pub fn is_completed(&self, task_id: &str) -> bool {
        self.completed.iter().any(|id| id == task_id)
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn open_default() -> Result<Self> {
        let store = Self::new(dayplan_home()?);
        store.ensure()?;
        Ok(store)
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| format!("create {}", self.root.display()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.root.join("tasks.json")
    }

    pub fn learned_path(&self) -> PathBuf {
        self.root.join("learned.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join("ledger.jsonl")
    }

    pub fn day_path(&self) -> PathBuf {
        self.root.join("today.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        Ok(read_json(&self.tasks_path())?.unwrap_or_default())
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        write_json(&self.tasks_path(), tasks)
    }

    pub fn load_learned(&self) -> Result<LearnedHistory> {
        Ok(read_json(&self.learned_path())?.unwrap_or_default())
    }

    pub fn save_learned(&self, history: &LearnedHistory) -> Result<()> {
        write_json(&self.learned_path(), history)
    }

    pub fn load_day(&self) -> Result<Option<DayState>> {
        read_json(&self.day_path())
    }

    pub fn save_day(&self, day: &DayState) -> Result<()> {
        write_json(&self.day_path(), day)
    }

    pub fn append_ledger(&self, txn: &PointsTransaction) -> Result<()> {
        let p = self.ledger_path();
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .with_context(|| format!("open {}", p.display()))?;
        let line = serde_json::to_string(txn)?;
        writeln!(f, "{}", line).with_context(|| format!("append {}", p.display()))?;
        Ok(())
    }

    pub fn read_ledger(&self) -> Result<Vec<PointsTransaction>> {
        let p = self.ledger_path();
        if !p.exists() {
            return Ok(Vec::new());
        }
        let f = fs::File::open(&p).with_context(|| format!("read {}", p.display()))?;
        let mut out = Vec::new();
        for (n, line) in BufReader::new(f).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let txn = serde_json::from_str(&line)
                .with_context(|| format!("parse {} line {}", p.display(), n + 1))?;
            out.push(txn);
        }
        Ok(out)
    }
}

fn read_json<T: DeserializeOwned>(p: &Path) -> Result<Option<T>> {
    if !p.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let v = serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    Ok(Some(v))
}

fn write_json<T: Serialize + ?Sized>(p: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}
