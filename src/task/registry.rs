// src/task/registry.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, TaskdagError};

/// A task action: no inputs beyond ambient process context, side effects
/// only, reports success or a descriptive failure.
pub type Action = Box<dyn Fn() -> anyhow::Result<()>>;

/// A named unit of work with declared prerequisites.
pub struct Task {
    name: String,
    deps: Vec<String>,
    action: Action,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct dependency task names, in declaration order.
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub(crate) fn invoke(&self) -> anyhow::Result<()> {
        (self.action)()
    }
}

/// Mapping from task name to task definition.
///
/// Tasks are registered once at process start and never mutated afterwards.
/// The map is keyed by name; re-registering a name replaces the earlier
/// definition, which validation treats as a configuration mistake only when
/// it produces an inconsistent graph.
#[derive(Default)]
pub struct Registry {
    tasks: BTreeMap<String, Task>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task with its direct dependencies and action.
    pub fn task<F>(&mut self, name: &str, deps: &[&str], action: F)
    where
        F: Fn() -> anyhow::Result<()> + 'static,
    {
        self.tasks.insert(
            name.to_string(),
            Task {
                name: name.to_string(),
                deps: deps.iter().map(|d| d.to_string()).collect(),
                action: Box::new(action),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All registered task names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// All registered tasks, sorted by name.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Check the whole graph up front: every dependency must refer to a
    /// registered task and the dependency relation must be acyclic.
    ///
    /// The scheduler additionally guards against cycles at run time, but a
    /// bad graph is a configuration error and deserves to fail before any
    /// task body runs.
    pub fn validate(&self) -> Result<()> {
        for task in self.tasks.values() {
            for dep in task.deps() {
                if !self.tasks.contains_key(dep) {
                    return Err(TaskdagError::Config(format!(
                        "task '{}' has unknown dependency '{}'",
                        task.name(),
                        dep
                    )));
                }
            }
        }

        // Edge direction: dep -> task; a toposort fails iff there is a cycle.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }
        for task in self.tasks.values() {
            for dep in task.deps() {
                graph.add_edge(dep.as_str(), task.name(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(TaskdagError::Cycle(cycle.node_id().to_string())),
        }
    }
}
