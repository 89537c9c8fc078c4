// src/config/mod.rs

//! Configuration loading and validation for buildwatch.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: read a config file from disk.
//! - `validate.rs`: reference checks, dependency cycles, durations.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, CoordinatorConfig, DaemonConfig, DaemonTable, ProjectConfig,
    RawConfigFile,
};
