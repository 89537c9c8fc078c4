// src/engine/supervisor.rs

//! The continuous build-and-run loop.
//!
//! ```text
//! INIT -> BUILDING -> RUNNING <-> REBUILDING
//! ```
//!
//! Everything runs on one task, strictly sequentially: daemons are built one
//! after another and the only suspension points are the poll sleep and the
//! bounded wait while stopping a process. Any error aborts the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::build::{build_dir_name, Project};
use crate::config::{ConfigFile, CoordinatorConfig};
use crate::engine::daemon::Daemon;
use crate::engine::policy::decide_restart;
use crate::errors::Result;
use crate::exec::{CommandRunner, ManagedProcess};

/// Options that bound the otherwise endless loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupervisorOptions {
    /// Stop everything and return after this many poll cycles.
    pub max_iterations: Option<u64>,
}

pub struct Supervisor {
    coordinator: Option<(CoordinatorConfig, ManagedProcess)>,
    daemons: Vec<Daemon>,
    poll_interval: Duration,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("daemons", &self.daemons)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn from_config(cfg: &ConfigFile, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let daemons = cfg
            .daemon
            .iter()
            .map(|(name, daemon_cfg)| {
                let project = Project::resolve(cfg, &daemon_cfg.project, Arc::clone(&runner))?;
                Ok(Daemon::new(name, daemon_cfg, project, cfg.stop_policy))
            })
            .collect::<Result<Vec<_>>>()?;

        let coordinator = cfg.coordinator.clone().map(|c| {
            let process = ManagedProcess::new("coordinator").with_stop_policy(cfg.stop_policy);
            (c, process)
        });

        Ok(Self {
            coordinator,
            daemons,
            poll_interval: cfg.poll_interval,
        })
    }

    pub fn daemons(&self) -> &[Daemon] {
        &self.daemons
    }

    pub fn daemons_mut(&mut self) -> &mut [Daemon] {
        &mut self.daemons
    }

    /// INIT: launch the coordination service. Not build-tracked and never
    /// restarted.
    pub fn start_coordinator(&mut self) -> Result<()> {
        if let Some((cfg, process)) = self.coordinator.as_mut() {
            process.start(&cfg.executable, &cfg.args)?;
        }
        Ok(())
    }

    /// BUILDING: clone and build every daemon, in configuration order.
    pub async fn build_all(&mut self, build_dir_name: &str) -> Result<()> {
        for daemon in self.daemons.iter_mut() {
            info!(daemon = %daemon.name(), "initial build");
            daemon.clone_sources().await?;
            daemon.build(build_dir_name).await?;
        }
        Ok(())
    }

    /// RUNNING: start whatever is not running.
    pub fn ensure_running(&mut self) -> Result<()> {
        for daemon in self.daemons.iter_mut() {
            if daemon.ensure_started()? {
                let pid = daemon.pid();
                info!(daemon = %daemon.name(), pid, "daemon started");
            }
        }
        Ok(())
    }

    /// Log the PID of every supervised process (-1 when not running).
    pub fn report(&mut self) {
        for daemon in self.daemons.iter_mut() {
            let pid = daemon.pid();
            info!(daemon = %daemon.name(), pid, "daemon status");
        }
        if let Some((_, process)) = self.coordinator.as_mut() {
            info!(pid = process.pid(), "coordinator status");
        }
    }

    /// REBUILDING: re-clone and rebuild each daemon whose sources moved.
    ///
    /// Returns, per daemon in order, whether it was rebuilt.
    pub async fn rebuild_changed(&mut self, build_dir_name: &str) -> Result<Vec<bool>> {
        let mut rebuilt = Vec::with_capacity(self.daemons.len());
        for daemon in self.daemons.iter_mut() {
            if daemon.has_upstream_change().await? {
                info!(daemon = %daemon.name(), build_dir = %build_dir_name, "rebuilding");
                daemon.clone_sources().await?;
                daemon.build(build_dir_name).await?;
                rebuilt.push(true);
            } else {
                debug!(daemon = %daemon.name(), "no upstream change");
                rebuilt.push(false);
            }
        }
        Ok(rebuilt)
    }

    /// Stop the daemons the restart policy selects; the next RUNNING pass
    /// starts them again on their newest binary.
    pub async fn apply_restart_policy(&mut self, rebuilt: &[bool]) -> Result<()> {
        for (daemon, &was_rebuilt) in self.daemons.iter_mut().zip(rebuilt) {
            if decide_restart(daemon.restart_policy(), was_rebuilt) {
                info!(
                    daemon = %daemon.name(),
                    was_rebuilt,
                    policy = ?daemon.restart_policy(),
                    "stopping daemon for restart"
                );
                daemon.stop().await?;
            }
        }
        Ok(())
    }

    /// Stop all daemons. The coordinator is left running.
    pub async fn shutdown(&mut self) -> Result<()> {
        for daemon in self.daemons.iter_mut() {
            daemon.shutdown().await?;
        }
        Ok(())
    }

    /// Run until an error, Ctrl-C, or `max_iterations` cycles.
    pub async fn run(mut self, options: SupervisorOptions) -> Result<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = shutdown_tx.send(()).await;
        });

        self.start_coordinator()?;
        self.build_all(&build_dir_name(&Local::now())).await?;

        let mut iteration: u64 = 0;
        loop {
            iteration += 1;
            info!(iteration, "poll cycle");

            self.ensure_running()?;
            self.report();

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                Some(()) = shutdown_rx.recv() => {
                    info!("shutdown requested; stopping daemons");
                    return self.shutdown().await;
                }
            }

            let name = build_dir_name(&Local::now());
            let rebuilt = self.rebuild_changed(&name).await?;
            self.apply_restart_policy(&rebuilt).await?;

            if options.max_iterations.is_some_and(|max| iteration >= max) {
                info!(iteration, "iteration limit reached; stopping daemons");
                return self.shutdown().await;
            }
        }
    }
}
