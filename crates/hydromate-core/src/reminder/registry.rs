//! In-process periodic task registry on tokio.
//!
//! Holds at most one live task per unique name. Like platform job schedulers,
//! a newly registered task runs once immediately and then every interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::now_ms;
use super::task::{EnqueueOutcome, ExistingTaskPolicy, PeriodicTaskRequest, TaskInput, TaskScheduler};

/// Shortest period a task may be registered with.
pub const MIN_PERIODIC_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

struct RegisteredTask {
    interval: Duration,
    input: TaskInput,
    handle: JoinHandle<()>,
}

pub struct TaskRegistry {
    tasks: HashMap<String, RegisteredTask>,
    clock: Clock,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(now_ms))
    }

    /// Use `clock` for the `now_ms` passed to each run.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            tasks: HashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn interval_of(&self, name: &str) -> Option<Duration> {
        self.tasks.get(name).map(|t| t.interval)
    }

    pub fn input_of(&self, name: &str) -> Option<TaskInput> {
        self.tasks.get(name).map(|t| t.input)
    }

    fn spawn(&self, request: PeriodicTaskRequest) -> RegisteredTask {
        let interval = request.interval.max(MIN_PERIODIC_INTERVAL);
        let input = request.input;
        let work = request.work;
        let name = request.name;
        let clock = self.clock.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = work.run(&input, clock());
                debug!(task = %name, ?outcome, "periodic task ran");
            }
        });

        RegisteredTask {
            interval,
            input,
            handle,
        }
    }
}

impl TaskScheduler for TaskRegistry {
    fn enqueue_unique_periodic(
        &mut self,
        request: PeriodicTaskRequest,
        policy: ExistingTaskPolicy,
    ) -> EnqueueOutcome {
        let name = request.name.clone();
        let outcome = match (self.tasks.contains_key(&name), policy) {
            (true, ExistingTaskPolicy::Keep) => {
                debug!(task = %name, "task already registered, keeping it");
                return EnqueueOutcome::Kept;
            }
            (true, ExistingTaskPolicy::Replace) => EnqueueOutcome::Replaced,
            (false, _) => EnqueueOutcome::Enqueued,
        };

        let task = self.spawn(request);
        info!(task = %name, interval_secs = task.interval.as_secs(), ?outcome, "periodic task registered");
        if let Some(previous) = self.tasks.insert(name, task) {
            previous.handle.abort();
        }
        outcome
    }

    fn cancel_unique(&mut self, name: &str) -> bool {
        match self.tasks.remove(name) {
            Some(task) => {
                task.handle.abort();
                info!(task = %name, "periodic task cancelled");
                true
            }
            None => false,
        }
    }

    fn is_scheduled(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.handle.abort();
        }
    }
}
