// src/engine/mod.rs

//! Supervision engine.
//!
//! - [`daemon`]: one supervised daemon (project recipe + process handle).
//! - [`policy`]: when a daemon is restarted after a poll cycle.
//! - [`supervisor`]: the continuous build-and-run loop.

pub mod daemon;
pub mod policy;
pub mod supervisor;

pub use daemon::Daemon;
pub use policy::decide_restart;
pub use supervisor::{Supervisor, SupervisorOptions};
