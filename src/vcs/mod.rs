// src/vcs/mod.rs

//! Version-control adapter.
//!
//! - [`repo`] wraps the git CLI for one tracked repository: clone/pull,
//!   checkout, branch inspection, head/merge-base resolution.
//! - [`upstream`] classifies a local branch against its remote counterpart.

pub mod repo;
pub mod upstream;

pub use repo::{GitRepo, ProbeError, RepositoryHandle};
pub use upstream::UpstreamState;
