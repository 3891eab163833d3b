//! Loop state model and task transition logic.
//!
//! Pure data + transitions: nothing here touches the filesystem. Commands
//! load a [`LoopState`] through [`crate::store`], mutate it here, and write
//! it back, so the state machine is testable without any I/O.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::LoopError;
use crate::plan::ParsedTask;

/// Version written into every persisted document. Readers must treat any
/// document with a newer version as absent rather than guess at its shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Default per-task retry budget when neither config nor flags override it.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Iteration detail is truncated to this many chars before storage so the
/// state file cannot grow without bound from pasted test output.
pub const DETAIL_STORE_CAP: usize = 2000;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Passed,
    Failed,
    Skipped,
}

impl TaskStatus {
    /// Terminal statuses never transition again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }
}

/// Reported outcome for one attempt at the active task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

/// One recorded attempt against a task. Append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Iteration {
    pub at: DateTime<Utc>,
    pub outcome: Outcome,
    pub detail: String,
}

/// One checklist item extracted from the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub index: usize,
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    pub status: TaskStatus,
    pub retry_count: u32,
    pub iterations: Vec<Iteration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Most recent recorded iteration, if any.
    pub fn last_iteration(&self) -> Option<&Iteration> {
        self.iterations.last()
    }
}

/// The persisted loop document (`.taskloop/state.json`).
///
/// `cursor` must serialize even when unset (as `null`): its presence is part
/// of the required-field check that separates a valid document from junk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoopState {
    pub schema_version: u32,
    pub plan_source: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_command: Option<String>,
    pub max_retries: u32,
    pub cursor: Option<usize>,
    pub tasks: Vec<Task>,
}

/// Build/test/lint commands attached to the loop at init time. Opaque to the
/// tracker; it never runs them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    pub build: Option<String>,
    pub test: Option<String>,
    pub lint: Option<String>,
}

/// What happened after the active task was advanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTask {
    /// The same task stays active for another attempt.
    Retry,
    /// The task at this index was promoted to in-progress.
    Promoted(usize),
    /// No pending task remained; the loop is complete.
    Complete,
}

/// Result of applying one reported outcome, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEffect {
    pub task_index: usize,
    pub outcome: Outcome,
    /// 1-based attempt ordinal for this report ("this was attempt N").
    pub attempt: usize,
    pub new_status: TaskStatus,
    /// Attempts left before the task fails terminally. Only set on a
    /// non-terminal fail.
    pub retries_left: Option<u32>,
    pub next: NextTask,
}

impl LoopState {
    /// Build a fresh loop from parsed plan tasks. Every task starts pending
    /// with the cursor unset; the first promotion happens lazily on the next
    /// status check.
    pub fn new(
        plan_source: &str,
        parsed: Vec<ParsedTask>,
        commands: CommandSet,
        max_retries: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let tasks = parsed
            .into_iter()
            .enumerate()
            .map(|(index, t)| Task {
                index,
                description: t.description,
                acceptance_criteria: t.acceptance_criteria,
                status: TaskStatus::Pending,
                retry_count: 0,
                iterations: Vec::new(),
                started_at: None,
                completed_at: None,
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            plan_source: plan_source.to_string(),
            started_at: now,
            completed_at: None,
            build_command: commands.build,
            test_command: commands.test,
            lint_command: commands.lint,
            max_retries,
            cursor: None,
            tasks,
        }
    }

    /// Index of the task the cursor points at, if that task really is
    /// in-progress. An unset, out-of-range, or stale cursor all read as
    /// "no active task".
    pub fn active_task(&self) -> Option<usize> {
        let idx = self.cursor?;
        match self.tasks.get(idx) {
            Some(task) if task.status == TaskStatus::InProgress => Some(idx),
            _ => None,
        }
    }

    /// True once every task has reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_terminal())
    }

    /// Number of tasks in a terminal status.
    pub fn done_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.status.is_terminal()).count()
    }

    /// Promote the earliest pending task to in-progress, if no task is
    /// active and the loop is not complete. Returns the promoted index.
    pub fn promote_next(&mut self, now: DateTime<Utc>) -> Option<usize> {
        if self.active_task().is_some() {
            return None;
        }
        let idx = self
            .tasks
            .iter()
            .position(|t| t.status == TaskStatus::Pending)?;
        let task = &mut self.tasks[idx];
        task.status = TaskStatus::InProgress;
        task.started_at = Some(now);
        self.cursor = Some(idx);
        Some(idx)
    }

    /// Apply one reported outcome to the active task.
    ///
    /// Fails with [`LoopError::NoActiveTask`] without mutating anything when
    /// no task is in-progress. On success the full transition table runs:
    /// pass and skip are terminal, fail retries until `max_retries` attempts
    /// have been consumed, and any terminal transition advances the cursor
    /// (promoting the next pending task or completing the loop).
    pub fn record(
        &mut self,
        outcome: Outcome,
        detail: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportEffect, LoopError> {
        let idx = self.active_task().ok_or(LoopError::NoActiveTask)?;
        let max_retries = self.max_retries;

        let task = &mut self.tasks[idx];
        task.iterations.push(Iteration {
            at: now,
            outcome,
            detail: truncate_chars(detail, DETAIL_STORE_CAP),
        });
        let attempt = task.iterations.len();

        let (new_status, retries_left) = match outcome {
            Outcome::Pass => (TaskStatus::Passed, None),
            Outcome::Skip => (TaskStatus::Skipped, None),
            Outcome::Fail => {
                task.retry_count += 1;
                if task.retry_count >= max_retries {
                    (TaskStatus::Failed, None)
                } else {
                    (TaskStatus::InProgress, Some(max_retries - task.retry_count))
                }
            }
        };

        let next = if new_status.is_terminal() {
            let task = &mut self.tasks[idx];
            task.status = new_status;
            task.completed_at = Some(now);
            self.cursor = None;
            match self.promote_next(now) {
                Some(promoted) => NextTask::Promoted(promoted),
                None => {
                    self.completed_at = Some(now);
                    NextTask::Complete
                }
            }
        } else {
            NextTask::Retry
        };

        Ok(ReportEffect {
            task_index: idx,
            outcome,
            attempt,
            new_status,
            retries_left,
            next,
        })
    }
}

/// Truncate to at most `max` chars, cutting on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
