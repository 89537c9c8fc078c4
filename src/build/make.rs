// src/build/make.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::Result;
use crate::exec::{CommandRunner, CommandSpec};

/// Plain in-tree `make` build, no configure step.
pub struct MakeBuild {
    dir: PathBuf,
    jobs: usize,
    privilege_prefix: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl MakeBuild {
    pub fn new(dir: impl Into<PathBuf>, jobs: usize, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            dir: dir.into(),
            jobs,
            privilege_prefix: Vec::new(),
            runner,
        }
    }

    pub fn privilege_prefix(mut self, prefix: &[String]) -> Self {
        self.privilege_prefix = prefix.to_vec();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn compile(&self) -> Result<()> {
        let cmd = CommandSpec::new("make").arg("-j").arg(self.jobs.to_string());
        self.runner.run(&self.dir, &cmd).await?;
        Ok(())
    }

    pub async fn install(&self) -> Result<()> {
        let cmd = CommandSpec::new("make")
            .arg("install")
            .wrapped(&self.privilege_prefix);
        self.runner.run(&self.dir, &cmd).await?;
        Ok(())
    }
}
