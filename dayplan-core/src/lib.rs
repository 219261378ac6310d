//! dayplan-core: adaptive scheduling and points engine for the daily planner.
//!
//! Everything here is pure and synchronous. Persistence, rendering and
//! "what day is it" belong to the caller.

pub mod context;
pub mod error;
pub mod learned;
pub mod planner;
pub mod points;
pub mod scorer;
pub mod task;
pub mod variant;

pub use context::{MorningContext, SleepQuality};
pub use error::{ContextError, TaskError};
pub use learned::{apply_review, LearnedHistory, LearnedRecord};
pub use planner::{
    build_day_plan, Alert, AlertLevel, BlockedTask, DayPlan, ScheduledItem, Tier, GRACE_MINUTES,
};
pub use points::{
    calc_points, perfect_day_bonus, total_points, DayProgress, PointsAward, PointsTransaction,
    FEEDBACK_POINTS, PERFECT_DAY_BONUS,
};
pub use scorer::{score_task, ScoredTask};
pub use task::{validate_tasks, Category, DayCode, Frequency, Task, TimeOfDay, Variant};
pub use variant::pick_variant;
