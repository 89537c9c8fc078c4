// src/exec/process.rs

//! Supervision of long-running child processes (daemons, coordinator).

use std::fs;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::{access, AccessFlags, Pid};
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::{BuildwatchError, Result};

/// Value reported by [`ManagedProcess::pid`] when nothing is running.
pub const NOT_RUNNING_PID: i32 = -1;

/// How long [`ManagedProcess::stop`] waits for a terminated process to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    pub poll_interval: Duration,
    pub max_checks: u32,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_checks: 5,
        }
    }
}

/// A single supervised child process.
///
/// Holds at most one live OS process. Once the process exits (crash or
/// [`stop`](Self::stop)) the handle can be started again.
#[derive(Debug)]
pub struct ManagedProcess {
    label: String,
    stop_policy: StopPolicy,
    child: Option<Child>,
}

impl ManagedProcess {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stop_policy: StopPolicy::default(),
            child: None,
        }
    }

    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Spawn `executable` with `args`.
    ///
    /// The child is not killed when this handle is dropped; it lives until it
    /// exits or is stopped.
    pub fn start(&mut self, executable: &Path, args: &[String]) -> Result<()> {
        ensure_executable(executable)?;

        if self.is_running() {
            return Err(BuildwatchError::AlreadyRunning {
                label: self.label.clone(),
                pid: self.pid(),
            });
        }

        // Own process group: a terminal Ctrl-C reaches only buildwatch, which
        // then tears the daemons down itself.
        let child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .process_group(0)
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    BuildwatchError::NotExecutable(executable.to_path_buf())
                }
                _ => BuildwatchError::IoError(e),
            })?;

        info!(
            process = %self.label,
            executable = %executable.display(),
            pid = child.id().unwrap_or_default(),
            "process started"
        );

        self.child = Some(child);
        Ok(())
    }

    /// True iff a process was started and has not exited yet.
    ///
    /// Reaps the child if it has exited.
    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };

        match liveness(&self.label, child.try_wait()) {
            Liveness::Alive => true,
            Liveness::Exited => {
                self.child = None;
                false
            }
        }
    }

    /// OS process id, or [`NOT_RUNNING_PID`].
    pub fn pid(&mut self) -> i32 {
        if !self.is_running() {
            return NOT_RUNNING_PID;
        }
        self.child
            .as_ref()
            .and_then(Child::id)
            .map(|id| id as i32)
            .unwrap_or(NOT_RUNNING_PID)
    }

    /// Send SIGTERM and wait for the process to exit.
    ///
    /// Liveness is checked once per `poll_interval`, at most `max_checks`
    /// times. A process still alive after that is a [`BuildwatchError::StopTimeout`];
    /// no SIGKILL is sent.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }

        let pid = self.pid();
        info!(process = %self.label, pid, "sending SIGTERM");
        kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(std::io::Error::from)?;

        let mut checks = 0;
        while checks < self.stop_policy.max_checks && self.is_running() {
            sleep(self.stop_policy.poll_interval).await;
            checks += 1;
        }

        if self.is_running() {
            return Err(BuildwatchError::StopTimeout {
                label: self.label.clone(),
                pid,
                checks,
            });
        }

        debug!(process = %self.label, pid, checks, "process stopped");
        Ok(())
    }

    /// SIGKILL the process and reap it. Only used during shutdown.
    pub async fn kill(&mut self) -> Result<()> {
        if let Some(child) = self.child.as_mut() {
            warn!(process = %self.label, "killing process");
            child.kill().await?;
        }
        self.child = None;
        Ok(())
    }
}

/// Fail with [`BuildwatchError::NotExecutable`] unless `path` is a regular file
/// the current user may execute.
pub fn ensure_executable(path: &Path) -> Result<()> {
    let is_file = fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false);

    if !is_file || access(path, AccessFlags::X_OK).is_err() {
        return Err(BuildwatchError::NotExecutable(path.to_path_buf()));
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Liveness {
    Alive,
    Exited,
}

/// Interpret a `try_wait` result. A failed query keeps the handle: the
/// process may still be alive and must not be replaced by a second one.
fn liveness(label: &str, status: std::io::Result<Option<ExitStatus>>) -> Liveness {
    match status {
        Ok(None) => Liveness::Alive,
        Ok(Some(status)) => {
            warn!(process = %label, %status, "process exited");
            Liveness::Exited
        }
        Err(e) => {
            warn!(process = %label, error = %e, "failed to query process status");
            Liveness::Alive
        }
    }
}
