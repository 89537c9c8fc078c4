// src/engine/daemon.rs

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{info, warn};

use crate::build::Project;
use crate::config::DaemonConfig;
use crate::errors::{BuildwatchError, Result};
use crate::exec::{ensure_executable, ManagedProcess, StopPolicy};
use crate::types::RestartPolicy;

/// A supervised daemon: the project that builds it plus its process handle.
#[derive(Debug)]
pub struct Daemon {
    name: String,
    project: Project,
    executable_rel: PathBuf,
    args: Vec<String>,
    restart: RestartPolicy,
    process: ManagedProcess,
    executable: Option<PathBuf>,
}

impl Daemon {
    pub fn new(name: &str, cfg: &DaemonConfig, project: Project, stop_policy: StopPolicy) -> Self {
        Self {
            name: name.to_string(),
            project,
            executable_rel: cfg.executable.clone(),
            args: cfg.args.clone(),
            restart: cfg.restart,
            process: ManagedProcess::new(name).with_stop_policy(stop_policy),
            executable: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        self.restart
    }

    /// Binary produced by the most recent successful build, if any.
    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    pub async fn clone_sources(&self) -> Result<()> {
        self.project.clone_sources().await
    }

    pub async fn has_upstream_change(&self) -> Result<bool> {
        self.project.has_upstream_change().await
    }

    /// Build into `build_dir_name` and switch to the resulting binary.
    ///
    /// A running process keeps its old binary until it is restarted.
    pub async fn build(&mut self, build_dir_name: &str) -> Result<()> {
        let output_dir = self.project.build(build_dir_name).await?;
        let executable = output_dir.join(&self.executable_rel);
        ensure_executable(&executable)?;

        info!(daemon = %self.name, executable = %executable.display(), "daemon binary ready");
        self.executable = Some(executable);
        Ok(())
    }

    /// Start the daemon unless it is already running. Returns true if started.
    pub fn ensure_started(&mut self) -> Result<bool> {
        if self.process.is_running() {
            return Ok(false);
        }

        let executable = self.executable.as_deref().ok_or_else(|| {
            BuildwatchError::Other(anyhow!("daemon '{}' has not been built", self.name))
        })?;

        self.process.start(executable, &self.args)?;
        Ok(true)
    }

    pub fn is_running(&mut self) -> bool {
        self.process.is_running()
    }

    pub fn pid(&mut self) -> i32 {
        self.process.pid()
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.process.stop().await
    }

    /// Stop for good: graceful first, SIGKILL if that times out.
    pub async fn shutdown(&mut self) -> Result<()> {
        match self.process.stop().await {
            Err(BuildwatchError::StopTimeout { .. }) => {
                warn!(daemon = %self.name, "graceful stop timed out during shutdown");
                self.process.kill().await
            }
            other => other,
        }
    }
}
