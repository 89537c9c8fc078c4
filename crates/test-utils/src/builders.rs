#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use buildwatch::config::{
    ConfigFile, ConfigSection, CoordinatorConfig, DaemonConfig, DaemonTable, ProjectConfig,
    RawConfigFile,
};
use buildwatch::types::{BuildSystem, BuildType, RestartPolicy};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with a fast stop policy and poll interval so loops finish quickly,
/// and an empty privilege prefix so installs run unwrapped.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection {
                    workspace: workspace.as_ref().to_path_buf(),
                    organization: "acme".to_string(),
                    poll_interval: "10ms".to_string(),
                    stop_poll_interval: "100ms".to_string(),
                    privilege_prefix: Vec::new(),
                    ..ConfigSection::default()
                },
                coordinator: None,
                project: BTreeMap::new(),
                daemon: DaemonTable::default(),
            },
        }
    }

    pub fn with_project(mut self, name: &str, project: ProjectConfig) -> Self {
        self.config.project.insert(name.to_string(), project);
        self
    }

    pub fn with_daemon(mut self, name: &str, daemon: DaemonConfig) -> Self {
        self.config.daemon.insert(name, daemon);
        self
    }

    pub fn with_coordinator(mut self, executable: impl Into<PathBuf>, args: &[&str]) -> Self {
        self.config.coordinator = Some(CoordinatorConfig {
            executable: executable.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_privilege_prefix(mut self, prefix: &[&str]) -> Self {
        self.config.config.privilege_prefix = prefix.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `ProjectConfig`.
pub struct ProjectConfigBuilder {
    project: ProjectConfig,
}

impl ProjectConfigBuilder {
    pub fn new(repository: &str) -> Self {
        Self {
            project: ProjectConfig {
                repository: repository.to_string(),
                branch: "master".to_string(),
                build_type: BuildType::Release,
                build_system: BuildSystem::Cmake,
                cmake_flags: vec![],
                jobs: Some(1),
                install: false,
                vendored: vec![],
                after: vec![],
            },
        }
    }

    pub fn make(mut self) -> Self {
        self.project.build_system = BuildSystem::Make;
        self
    }

    pub fn build_type(mut self, build_type: BuildType) -> Self {
        self.project.build_type = build_type;
        self
    }

    pub fn cmake_flag(mut self, flag: &str) -> Self {
        self.project.cmake_flags.push(flag.to_string());
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.project.jobs = Some(jobs);
        self
    }

    pub fn install(mut self) -> Self {
        self.project.install = true;
        self
    }

    pub fn vendored(mut self, dir: &str) -> Self {
        self.project.vendored.push(dir.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.project.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> ProjectConfig {
        self.project
    }
}

/// Builder for `DaemonConfig`.
pub struct DaemonConfigBuilder {
    daemon: DaemonConfig,
}

impl DaemonConfigBuilder {
    pub fn new(project: &str, executable: &str) -> Self {
        Self {
            daemon: DaemonConfig {
                project: project.to_string(),
                executable: PathBuf::from(executable),
                args: vec![],
                restart: RestartPolicy::OnRebuild,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.daemon.args.push(arg.to_string());
        self
    }

    pub fn restart(mut self, policy: RestartPolicy) -> Self {
        self.daemon.restart = policy;
        self
    }

    pub fn build(self) -> DaemonConfig {
        self.daemon
    }
}
