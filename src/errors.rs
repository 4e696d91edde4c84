// src/errors.rs

//! Crate-wide error taxonomy for the orchestration core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskdagError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("cycle detected in task graph involving '{0}'")]
    Cycle(String),

    /// A task action reported failure. The scheduler does not interpret why,
    /// only that it failed; the cause comes from the action itself.
    #[error("task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TaskdagError>;
