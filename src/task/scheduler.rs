// src/task/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info};

use crate::errors::{Result, TaskdagError};
use crate::task::registry::Registry;

/// Per-run state of a task within one `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Task is on the current execution path: its dependencies (or its own
    /// action) are being worked on. Reaching a `Running` task again means
    /// the graph has a cycle.
    Running,
    /// Task's action completed successfully in this run; reaching it again
    /// via another path is a no-op.
    Done,
}

/// Dependency-aware sequential task runner.
///
/// Given a requested task, resolves the transitive dependency set via the
/// registry, runs every dependency before its dependents, executes each
/// task's action exactly once regardless of how many paths reach it, and
/// aborts the whole run at the first failure.
///
/// Execution state lives in a per-`run` map, reset between invocations;
/// nothing is shared between runs or hidden in the tasks themselves.
pub struct Scheduler<'r> {
    registry: &'r Registry,
}

impl<'r> Scheduler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Execute the named task and all of its transitive dependencies, each
    /// at most once, dependencies first. Returns the first error
    /// encountered; remaining tasks in the resolved order are not run.
    pub fn run(&self, name: &str) -> Result<()> {
        let mut states: HashMap<String, RunState> = HashMap::new();
        self.run_inner(name, &mut states)
    }

    fn run_inner(&self, name: &str, states: &mut HashMap<String, RunState>) -> Result<()> {
        match states.get(name) {
            Some(RunState::Done) => {
                debug!(task = %name, "already executed in this run; skipping");
                return Ok(());
            }
            Some(RunState::Running) => {
                // Revisited while still on the execution path: a cycle,
                // detected before any action in it runs.
                return Err(TaskdagError::Cycle(name.to_string()));
            }
            None => {}
        }

        let task = self
            .registry
            .get(name)
            .ok_or_else(|| TaskdagError::UnknownTask(name.to_string()))?;

        states.insert(name.to_string(), RunState::Running);

        for dep in task.deps() {
            debug!(task = %name, dep = %dep, "resolving dependency");
            self.run_inner(dep, states)?;
        }

        info!(task = %name, "running task");
        task.invoke().map_err(|source| TaskdagError::TaskFailed {
            task: name.to_string(),
            source,
        })?;

        states.insert(name.to_string(), RunState::Done);
        debug!(task = %name, "task completed");
        Ok(())
    }
}
