// src/build/cmake.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::{CommandRunner, CommandSpec};
use crate::types::BuildType;

/// Name of the marker file holding the commit a build directory was built from.
pub const COMMIT_MARKER: &str = "commit";

/// One configure + compile + install cycle in an out-of-source build directory.
pub struct CMakeBuild {
    build_dir: PathBuf,
    source_dir: PathBuf,
    build_type: BuildType,
    flags: Vec<String>,
    commit: String,
    jobs: usize,
    privilege_prefix: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl CMakeBuild {
    pub fn new(
        build_dir: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            build_dir: build_dir.into(),
            source_dir: source_dir.into(),
            build_type: BuildType::default(),
            flags: Vec::new(),
            commit: String::new(),
            jobs: 1,
            privilege_prefix: Vec::new(),
            runner,
        }
    }

    pub fn build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn flags(mut self, flags: &[String]) -> Self {
        self.flags = flags.to_vec();
        self
    }

    /// Commit recorded in the marker file. Empty means no marker is written.
    pub fn commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn privilege_prefix(mut self, prefix: &[String]) -> Self {
        self.privilege_prefix = prefix.to_vec();
        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Create the build directory (reused if present) and write the commit
    /// marker.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.build_dir)?;

        if !self.commit.is_empty() {
            let marker = self.build_dir.join(COMMIT_MARKER);
            fs::write(&marker, self.commit.as_bytes())?;
            debug!(marker = %marker.display(), commit = %self.commit, "wrote commit marker");
        }
        Ok(())
    }

    /// `cmake <flags> -DCMAKE_BUILD_TYPE=<type> <source dir>`. Never cached.
    pub async fn configure(&self) -> Result<()> {
        info!(dir = %self.build_dir.display(), build_type = %self.build_type, "configuring");
        let cmd = CommandSpec::new("cmake")
            .args(self.flags.iter().cloned())
            .arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type))
            .arg(self.source_dir.display().to_string());
        self.runner.run(&self.build_dir, &cmd).await?;
        Ok(())
    }

    /// `make -j <jobs>`.
    pub async fn compile(&self) -> Result<()> {
        let cmd = CommandSpec::new("make").arg("-j").arg(self.jobs.to_string());
        self.runner.run(&self.build_dir, &cmd).await?;
        Ok(())
    }

    /// `<privilege prefix> make install`. Unconditional.
    pub async fn install(&self) -> Result<()> {
        let cmd = CommandSpec::new("make")
            .arg("install")
            .wrapped(&self.privilege_prefix);
        self.runner.run(&self.build_dir, &cmd).await?;
        Ok(())
    }
}
