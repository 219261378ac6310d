use anyhow::{Context, Result};
use clap::Subcommand;
use dayplan_core::{validate_tasks, Task};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::state::Store;

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    /// Merge structured task records (JSON array) into the backlog, by id
    Import {
        /// Path to a JSON file holding an array of task records
        file: PathBuf,
    },

    /// List the backlog
    List,
}

pub fn run(store: &Store, cmd: TasksCommand) -> Result<()> {
    match cmd {
        TasksCommand::Import { file } => {
            let (added, updated) = import(store, &file)?;
            println!(
                "Imported {} tasks from {} ({} new, {} updated)",
                added + updated,
                file.display(),
                added,
                updated
            );
        }
        TasksCommand::List => list(store)?,
    }
    Ok(())
}

/// Returns (added, updated). Nothing is written unless every record is valid.
pub fn import(store: &Store, file: &Path) -> Result<(usize, usize)> {
    let s = fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let incoming: Vec<Task> =
        serde_json::from_str(&s).with_context(|| format!("parse {}", file.display()))?;
    validate_tasks(&incoming).with_context(|| format!("invalid tasks in {}", file.display()))?;

    let mut tasks = store.load_tasks()?;
    let mut added = 0;
    let mut updated = 0;
    for t in incoming {
        match tasks.iter_mut().find(|existing| existing.id == t.id) {
            Some(existing) => {
                debug!(task_id = %t.id, "replacing task");
                *existing = t;
                updated += 1;
            }
            None => {
                debug!(task_id = %t.id, "adding task");
                tasks.push(t);
                added += 1;
            }
        }
    }

    validate_tasks(&tasks).context("merged backlog is invalid")?;
    store.save_tasks(&tasks)?;
    Ok((added, updated))
}

fn list(store: &Store) -> Result<()> {
    let tasks = store.load_tasks()?;
    if tasks.is_empty() {
        println!("No tasks. Import some: dayplan tasks import <file.json>");
        return Ok(());
    }
    for t in &tasks {
        let tier = if t.mandatory {
            "mandatory"
        } else if t.critical {
            "critical"
        } else {
            "normal"
        };
        println!(
            "{} | {} | {} | {} min | energy {} | {:?}{}",
            t.id,
            t.name,
            tier,
            t.duration_minutes,
            t.energy_required,
            t.frequency,
            t.deadline.map(|d| format!(" | due {d}")).unwrap_or_default()
        );
        for v in &t.variants {
            println!("    ~ {} ({} min, energy {})", v.name, v.duration_minutes, v.energy_required);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_merges_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save_tasks(&[Task::new("a", "Old A")]).unwrap();

        let file = dir.path().join("batch.json");
        fs::write(
            &file,
            r#"[
                {"id": "a", "name": "New A", "energyRequired": 3, "durationMinutes": 15},
                {"id": "b", "name": "B", "energyRequired": 6, "durationMinutes": 60, "critical": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(import(&store, &file).unwrap(), (1, 1));
        let tasks = store.load_tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "New A");
        assert!(tasks[1].critical);
    }

    #[test]
    fn invalid_batch_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let file = dir.path().join("bad.json");
        fs::write(
            &file,
            r#"[{"id": "z", "name": "Zero", "energyRequired": 3, "durationMinutes": 0}]"#,
        )
        .unwrap();

        assert!(import(&store, &file).is_err());
        assert!(!store.tasks_path().exists());
    }
}
