// src/config/model.rs

use std::collections::BTreeMap;
use std::ops::Index;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::exec::StopPolicy;
use crate::types::{BuildSystem, BuildType, RestartPolicy};

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [config]
/// workspace = "/home/ci"
/// organization = "CacheboxInc"
/// poll_interval = "60s"
///
/// [coordinator]
/// executable = "/home/ci/etcd/etcd"
///
/// [project.stord]
/// repository = "hyc-storage-layer"
/// cmake_flags = ["-DUSE_NEP=OFF"]
/// vendored = ["thirdparty/ha-lib"]
///
/// [daemon.stord]
/// project = "stord"
/// executable = "src/stord/stord"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub coordinator: Option<CoordinatorConfig>,

    /// Buildable projects keyed by name (`[project.<name>]`).
    #[serde(default)]
    pub project: BTreeMap<String, ProjectConfig>,

    /// Supervised daemons keyed by name (`[daemon.<name>]`), in file order.
    #[serde(default)]
    pub daemon: DaemonTable,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub coordinator: Option<CoordinatorConfig>,
    pub project: BTreeMap<String, ProjectConfig>,
    pub daemon: DaemonTable,
    /// Parsed `[config].poll_interval`.
    pub poll_interval: Duration,
    /// Parsed `[config].stop_poll_interval` + `stop_max_checks`.
    pub stop_policy: StopPolicy,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        poll_interval: Duration,
        stop_policy: StopPolicy,
    ) -> Self {
        Self {
            config: raw.config,
            coordinator: raw.coordinator,
            project: raw.project,
            daemon: raw.daemon,
            poll_interval,
            stop_policy,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Parent directory all repositories are cloned into.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    #[serde(default = "default_git_host")]
    pub git_host: String,

    /// Owner part of `git@<host>:<organization>/<repo>.git`.
    #[serde(default)]
    pub organization: String,

    /// Sleep between poll cycles, e.g. `"60s"`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Delay between liveness checks while stopping a daemon.
    #[serde(default = "default_stop_poll_interval")]
    pub stop_poll_interval: String,

    #[serde(default = "default_stop_max_checks")]
    pub stop_max_checks: u32,

    /// Wrapper for `make install`; empty runs it unwrapped.
    #[serde(default = "default_privilege_prefix")]
    pub privilege_prefix: Vec<String>,
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_git_host() -> String {
    "github.com".to_string()
}

fn default_poll_interval() -> String {
    "60s".to_string()
}

fn default_stop_poll_interval() -> String {
    "1s".to_string()
}

fn default_stop_max_checks() -> u32 {
    5
}

fn default_privilege_prefix() -> Vec<String> {
    vec!["sudo".to_string()]
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            git_host: default_git_host(),
            organization: String::new(),
            poll_interval: default_poll_interval(),
            stop_poll_interval: default_stop_poll_interval(),
            stop_max_checks: default_stop_max_checks(),
            privilege_prefix: default_privilege_prefix(),
        }
    }
}

/// `[coordinator]` section: the cluster coordination service started once at
/// startup and never rebuilt.
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    pub executable: PathBuf,

    #[serde(default)]
    pub args: Vec<String>,
}

/// `[project.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Repository name under the configured organization.
    pub repository: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default)]
    pub build_type: BuildType,

    #[serde(default)]
    pub build_system: BuildSystem,

    /// Extra arguments placed before `-DCMAKE_BUILD_TYPE`.
    #[serde(default)]
    pub cmake_flags: Vec<String>,

    /// Parallelism for `make -j`; defaults to the number of available CPUs.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Run `make install` after compiling.
    #[serde(default)]
    pub install: bool,

    /// Library directories inside the repository that are built and
    /// installed before the project itself.
    #[serde(default)]
    pub vendored: Vec<String>,

    /// Projects whose full recipe runs before this one.
    #[serde(default)]
    pub after: Vec<String>,
}

fn default_branch() -> String {
    "master".to_string()
}

impl ProjectConfig {
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// `[daemon.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Project that produces this daemon's binary.
    pub project: String,

    /// Binary path relative to the project's build output: the timestamped
    /// build directory for cmake projects, the checkout for make projects.
    pub executable: PathBuf,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub restart: RestartPolicy,
}

/// `[daemon.<name>]` sections in declaration order.
///
/// Daemons are built and started in this order, so the first declared daemon
/// always comes up first.
#[derive(Debug, Clone, Default)]
pub struct DaemonTable {
    entries: Vec<(String, DaemonConfig)>,
}

impl DaemonTable {
    /// Add `name`, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, daemon: DaemonConfig) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = daemon,
            None => self.entries.push((name, daemon)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DaemonConfig> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, daemon)| daemon)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DaemonConfig)> {
        self.entries
            .iter()
            .map(|(name, daemon)| (name.as_str(), daemon))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Index<&str> for DaemonTable {
    type Output = DaemonConfig;

    fn index(&self, name: &str) -> &DaemonConfig {
        match self.get(name) {
            Some(daemon) => daemon,
            None => panic!("no daemon named '{name}'"),
        }
    }
}

impl<'de> Deserialize<'de> for DaemonTable {
    /// Relies on toml's `preserve_order` feature: the intermediate table keeps
    /// the document order of its keys.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let table = toml::Table::deserialize(deserializer)?;
        let mut daemons = DaemonTable::default();
        for (name, value) in table {
            let daemon: DaemonConfig = value
                .try_into()
                .map_err(|e| D::Error::custom(format!("daemon '{name}': {e}")))?;
            daemons.insert(name, daemon);
        }
        Ok(daemons)
    }
}
