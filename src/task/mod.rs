// src/task/mod.rs

//! Task registry and dependency-aware scheduler.

pub mod registry;
pub mod scheduler;

pub use registry::{Registry, Task};
pub use scheduler::Scheduler;
