//! Refinement task identity and lifecycle.
//!
//! A task represents one run of either engine. It is owned exclusively by the
//! engine instance executing it and handed back to the caller inside the
//! final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One run of a refinement engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementTask {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Which engine is driving the run
    pub kind: TaskKind,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// Hard maximum number of passes (>= 1)
    pub loop_budget: u32,

    /// Current lifecycle state
    pub state: TaskState,
}

impl RefinementTask {
    /// Create a new pending task
    pub fn new(kind: TaskKind, loop_budget: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            created_at: Utc::now(),
            loop_budget,
            state: TaskState::Pending,
        }
    }

    /// Check if the task is still in progress
    pub fn is_running(&self) -> bool {
        matches!(self.state, TaskState::Running)
    }

    /// Check if the task has reached a terminal state
    pub fn is_finished(&self) -> bool {
        !matches!(self.state, TaskState::Pending | TaskState::Running)
    }
}

/// Which engine a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Transcript expansion toward a target word count
    Expansion,

    /// Research aggregation over a set of source URLs
    Research,
}

/// Lifecycle state of a refinement task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created, no pass started
    Pending,

    /// Currently executing passes
    Running,

    /// Terminated with the target/convergence condition fully met
    Succeeded,

    /// Terminated with usable output but an unmet target, exhausted budget,
    /// or failed sources
    SucceededPartial,

    /// Terminated without completing a single pass, or rejected outright
    Failed,

    /// Stopped by a cancellation request between passes
    Cancelled,
}

/// Why a run terminated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Outcome {
    /// The convergence target was reached
    ReachedTarget,

    /// The loop budget ran out before the target was met
    BudgetExhausted,

    /// Two consecutive passes made no forward progress
    NoProgress,

    /// A generation call failed permanently
    Failed { reason: String },

    /// Cancellation was requested between passes
    Cancelled,
}

impl Outcome {
    /// The task state implied by this outcome, given how many passes completed
    /// and whether the convergence condition was fully met
    pub fn task_state(&self, passes_completed: u32, fully_met: bool) -> TaskState {
        match self {
            Outcome::ReachedTarget if fully_met => TaskState::Succeeded,
            Outcome::ReachedTarget => TaskState::SucceededPartial,
            Outcome::BudgetExhausted | Outcome::NoProgress => TaskState::SucceededPartial,
            Outcome::Failed { .. } if passes_completed > 0 => TaskState::SucceededPartial,
            Outcome::Failed { .. } => TaskState::Failed,
            Outcome::Cancelled => TaskState::Cancelled,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::ReachedTarget => write!(f, "reached-target"),
            Outcome::BudgetExhausted => write!(f, "budget-exhausted"),
            Outcome::NoProgress => write!(f, "no-progress"),
            Outcome::Failed { reason } => write!(f, "failed: {}", reason),
            Outcome::Cancelled => write!(f, "cancelled"),
        }
    }
}
