// src/build/recipe.rs

//! Composite per-project build recipes.
//!
//! A [`Project`] is resolved from configuration into a tree: each dependency
//! listed in `after` is itself a full `Project` whose recipe runs (including
//! its own dependencies) before the dependent project builds. Shared
//! dependencies are rebuilt once per dependent; nothing is flattened.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tracing::info;

use crate::build::cmake::CMakeBuild;
use crate::build::make::MakeBuild;
use crate::config::{ConfigFile, ProjectConfig};
use crate::errors::{BuildwatchError, Result};
use crate::exec::CommandRunner;
use crate::types::{BuildSystem, BuildType};
use crate::vcs::{GitRepo, RepositoryHandle};

/// Subdirectory of a vendored library holding its plain-make third-party code.
pub const THIRD_PARTY_DIR: &str = "third-party";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A library vendored inside a project's repository.
///
/// Recipe: `make` its third-party directory, then a Release CMake build with
/// install.
pub struct VendoredLib {
    dir: PathBuf,
    jobs: usize,
    privilege_prefix: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl VendoredLib {
    pub fn new(
        dir: impl Into<PathBuf>,
        jobs: usize,
        privilege_prefix: &[String],
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            dir: dir.into(),
            jobs,
            privilege_prefix: privilege_prefix.to_vec(),
            runner,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn build(&self, build_dir_name: &str) -> Result<()> {
        info!(dir = %self.dir.display(), "building vendored library");

        MakeBuild::new(self.dir.join(THIRD_PARTY_DIR), 1, Arc::clone(&self.runner))
            .compile()
            .await?;

        let build = CMakeBuild::new(
            self.dir.join(build_dir_name),
            &self.dir,
            Arc::clone(&self.runner),
        )
        .build_type(BuildType::Release)
        .jobs(self.jobs)
        .privilege_prefix(&self.privilege_prefix);

        build.prepare()?;
        build.configure().await?;
        build.compile().await?;
        build.install().await
    }
}

/// One buildable project plus the projects it depends on.
pub struct Project {
    name: String,
    config: ProjectConfig,
    repo: GitRepo,
    deps: Vec<Project>,
    privilege_prefix: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("repo", &self.repo)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

impl Project {
    /// Resolve `name` and, recursively, its dependencies.
    ///
    /// The config must already be validated (acyclic `after` graph).
    pub fn resolve(cfg: &ConfigFile, name: &str, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let config = cfg.project.get(name).cloned().ok_or_else(|| {
            BuildwatchError::ConfigError(format!("unknown project '{}'", name))
        })?;

        let handle = RepositoryHandle::new(
            &cfg.config.workspace,
            &config.repository,
            &config.branch,
            &cfg.config.git_host,
            &cfg.config.organization,
        );

        let deps = config
            .after
            .iter()
            .map(|dep| Project::resolve(cfg, dep, Arc::clone(&runner)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            repo: GitRepo::new(handle, Arc::clone(&runner)),
            config,
            deps,
            privilege_prefix: cfg.config.privilege_prefix.clone(),
            runner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo(&self) -> &GitRepo {
        &self.repo
    }

    pub fn deps(&self) -> &[Project] {
        &self.deps
    }

    /// Directory holding this project's build output for a given cycle.
    pub fn output_dir(&self, build_dir_name: &str) -> PathBuf {
        match self.config.build_system {
            BuildSystem::Cmake => self.repo.repo_dir().join(build_dir_name),
            BuildSystem::Make => self.repo.repo_dir(),
        }
    }

    /// Clone or update every repository in the tree, dependencies first,
    /// and check out the tracked branches.
    pub fn clone_sources(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            for dep in &self.deps {
                dep.clone_sources().await?;
            }
            self.repo.clone_repo().await?;
            self.repo.checkout_branch().await
        })
    }

    /// True when this repository or any dependency's repository has
    /// unseen upstream commits.
    pub fn has_upstream_change(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            if self.repo.has_upstream_change().await? {
                info!(project = %self.name, "upstream change detected");
                return Ok(true);
            }
            for dep in &self.deps {
                if dep.has_upstream_change().await? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Run the full recipe and return the output directory.
    ///
    /// Order: dependencies, HEAD commit lookup, vendored libraries, then
    /// this project's own build.
    pub fn build<'a>(&'a self, build_dir_name: &'a str) -> BoxFuture<'a, PathBuf> {
        Box::pin(async move {
            for dep in &self.deps {
                dep.build(build_dir_name).await?;
            }

            let commit = self.repo.head_commit(&self.config.branch).await?;
            info!(
                project = %self.name,
                %commit,
                build_dir = %build_dir_name,
                "building project"
            );

            let repo_dir = self.repo.repo_dir();
            let jobs = self.config.effective_jobs();

            for rel in &self.config.vendored {
                VendoredLib::new(
                    repo_dir.join(rel),
                    jobs,
                    &self.privilege_prefix,
                    Arc::clone(&self.runner),
                )
                .build(build_dir_name)
                .await?;
            }

            let output_dir = self.output_dir(build_dir_name);
            match self.config.build_system {
                BuildSystem::Cmake => {
                    let build = CMakeBuild::new(&output_dir, &repo_dir, Arc::clone(&self.runner))
                        .build_type(self.config.build_type)
                        .flags(&self.config.cmake_flags)
                        .commit(commit)
                        .jobs(jobs)
                        .privilege_prefix(&self.privilege_prefix);

                    build.prepare()?;
                    build.configure().await?;
                    build.compile().await?;
                    if self.config.install {
                        build.install().await?;
                    }
                }
                BuildSystem::Make => {
                    let build = MakeBuild::new(&output_dir, jobs, Arc::clone(&self.runner))
                        .privilege_prefix(&self.privilege_prefix);

                    build.compile().await?;
                    if self.config.install {
                        build.install().await?;
                    }
                }
            }

            info!(project = %self.name, output = %output_dir.display(), "project built");
            Ok(output_dir)
        })
    }
}
