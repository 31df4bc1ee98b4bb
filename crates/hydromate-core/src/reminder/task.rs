//! Periodic task vocabulary shared by the coordinator, the registry and the
//! reminder worker.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Data handed to the task when it was enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskInput {
    /// Wall-clock ms at which the task was (re)registered. 0 means unknown.
    pub enqueue_time_ms: u64,
}

/// What a single firing of the reminder task did. Every variant is a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOutcome {
    /// Fired inside the grace period right after scheduling.
    Suppressed,
    /// Notification handed to the sink.
    Notified,
    /// Permission missing, nothing shown.
    PermissionMissing,
}

/// Body of a periodic task.
pub trait PeriodicWork: Send + Sync {
    fn run(&self, input: &TaskInput, now_ms: u64) -> WorkOutcome;
}

/// What to do when a task with the same unique name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingTaskPolicy {
    /// Cancel the existing task and register the new one.
    #[default]
    Replace,
    /// Leave the existing task alone and drop the new one.
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    Replaced,
    Kept,
}

/// Request to run `work` every `interval` under a unique `name`.
#[derive(Clone)]
pub struct PeriodicTaskRequest {
    pub name: String,
    pub interval: Duration,
    pub input: TaskInput,
    pub work: Arc<dyn PeriodicWork>,
}

impl fmt::Debug for PeriodicTaskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicTaskRequest")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// Registry of uniquely named periodic tasks.
///
/// Implementations guarantee at most one live task per name.
pub trait TaskScheduler {
    fn enqueue_unique_periodic(
        &mut self,
        request: PeriodicTaskRequest,
        policy: ExistingTaskPolicy,
    ) -> EnqueueOutcome;

    /// Cancel the task if present. Returns whether one was cancelled.
    fn cancel_unique(&mut self, name: &str) -> bool;

    fn is_scheduled(&self, name: &str) -> bool;
}
