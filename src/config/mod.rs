// src/config/mod.rs

//! Configuration for the default target set, loaded from `Taskdag.toml`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::load_and_validate;
pub use model::{BuildSection, ConfigFile, GenerateSection, TestSection};
