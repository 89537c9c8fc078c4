// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] runs one-shot commands (git, cmake, make) to completion and
//!   provides the `CommandRunner` seam the adapters are written against.
//! - [`process`] supervises long-running children: start, liveness, bounded
//!   graceful stop.

pub mod command;
pub mod process;

pub use command::{CommandOutput, CommandRunner, CommandSpec, RealCommandRunner};
pub use process::{ensure_executable, ManagedProcess, StopPolicy, NOT_RUNNING_PID};
