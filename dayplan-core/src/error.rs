//! Validation errors for records entering the planner.
//!
//! Planning itself never fails: infeasible days and blocked tasks are
//! reported as data on the plan. These errors cover malformed input only.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("task id must be non-empty")]
    MissingId,

    #[error("task '{id}': name must be non-empty")]
    MissingName { id: String },

    #[error("task '{id}': duration must be at least 1 minute (got {minutes})")]
    NonPositiveDuration { id: String, minutes: i32 },

    #[error("task '{id}': energy must be 1..=10 (got {energy})")]
    EnergyOutOfRange { id: String, energy: i32 },

    #[error("task '{id}': variant '{variant}' has a negative duration")]
    NegativeVariantDuration { id: String, variant: String },

    #[error("task '{id}' lists itself as a blocker")]
    SelfBlocking { id: String },

    #[error("duplicate task id '{id}'")]
    DuplicateId { id: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("energy must be 1..=10 (got {0})")]
    EnergyOutOfRange(i32),

    #[error("hours available must be a finite, non-negative number (got {0})")]
    InvalidHours(f64),
}
