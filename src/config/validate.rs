// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildwatchError, Result};
use crate::exec::StopPolicy;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let poll_interval = duration_field("poll_interval", &raw.config.poll_interval)?;
        let stop_policy = StopPolicy {
            poll_interval: duration_field("stop_poll_interval", &raw.config.stop_poll_interval)?,
            max_checks: raw.config.stop_max_checks,
        };

        Ok(ConfigFile::new_unchecked(raw, poll_interval, stop_policy))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_daemons(cfg)?;
    validate_global_config(cfg)?;
    validate_projects(cfg)?;
    validate_daemons(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn duration_field(name: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value)
        .map_err(|e| BuildwatchError::ConfigError(format!("[config].{name}: {e}")))
}

fn ensure_has_daemons(cfg: &RawConfigFile) -> Result<()> {
    if cfg.daemon.is_empty() {
        return Err(BuildwatchError::ConfigError(
            "config must contain at least one [daemon.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.organization.trim().is_empty() {
        return Err(BuildwatchError::ConfigError(
            "[config].organization must not be empty".to_string(),
        ));
    }

    if cfg.config.stop_max_checks == 0 {
        return Err(BuildwatchError::ConfigError(
            "[config].stop_max_checks must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_projects(cfg: &RawConfigFile) -> Result<()> {
    for (name, project) in cfg.project.iter() {
        if project.repository.trim().is_empty() {
            return Err(BuildwatchError::ConfigError(format!(
                "project '{}' has an empty `repository`",
                name
            )));
        }
        if project.jobs == Some(0) {
            return Err(BuildwatchError::ConfigError(format!(
                "project '{}' must have jobs >= 1 (got 0)",
                name
            )));
        }
        for dep in project.after.iter() {
            if !cfg.project.contains_key(dep) {
                return Err(BuildwatchError::ConfigError(format!(
                    "project '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(BuildwatchError::ConfigError(format!(
                    "project '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_daemons(cfg: &RawConfigFile) -> Result<()> {
    for (name, daemon) in cfg.daemon.iter() {
        if !cfg.project.contains_key(&daemon.project) {
            return Err(BuildwatchError::ConfigError(format!(
                "daemon '{}' refers to unknown project '{}'",
                name, daemon.project
            )));
        }
        if daemon.executable.is_absolute() {
            return Err(BuildwatchError::ConfigError(format!(
                "daemon '{}' executable must be relative to the build output, got {:?}",
                name, daemon.executable
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> project.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.project.keys() {
        graph.add_node(name.as_str());
    }

    for (name, project) in cfg.project.iter() {
        for dep in project.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(BuildwatchError::DagCycle(format!(
                "cycle detected in project dependencies involving project '{}'",
                node
            )))
        }
    }
}
