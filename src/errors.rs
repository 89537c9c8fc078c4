// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! None of the domain errors are retried anywhere: they propagate up to
//! `main`, which prints them and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildwatchError {
    #[error(
        "command `{command}` failed with exit code {code}\nstdout:\n{}\nstderr:\n{}",
        stdout.join("\n"),
        stderr.join("\n")
    )]
    CommandFailed {
        command: String,
        code: i32,
        stdout: Vec<String>,
        stderr: Vec<String>,
    },

    #[error("reference '{reference}' resolved to {lines} lines, expected exactly one")]
    AmbiguousRef { reference: String, lines: usize },

    #[error("no current branch found in {0:?}")]
    NoCurrentBranch(PathBuf),

    #[error("local branch '{branch}' and origin/{branch} have diverged in {repo:?}")]
    DivergedHistory { repo: PathBuf, branch: String },

    #[error("{0:?} is not an executable regular file")]
    NotExecutable(PathBuf),

    #[error("process '{label}' is already running (pid {pid})")]
    AlreadyRunning { label: String, pid: i32 },

    #[error("process '{label}' (pid {pid}) still alive after {checks} liveness checks")]
    StopTimeout { label: String, pid: i32, checks: u32 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in project dependencies: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildwatchError>;
