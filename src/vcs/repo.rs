// src/vcs/repo.rs

//! Git operations for one tracked repository, driven through the git CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info};

use crate::errors::{BuildwatchError, Result};
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::vcs::upstream::UpstreamState;

/// Where a repository lives locally and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    parent_dir: PathBuf,
    name: String,
    branch: String,
    host: String,
    organization: String,
}

impl RepositoryHandle {
    pub fn new(
        parent_dir: impl Into<PathBuf>,
        name: impl Into<String>,
        branch: impl Into<String>,
        host: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            parent_dir: parent_dir.into(),
            name: name.into(),
            branch: branch.into(),
            host: host.into(),
            organization: organization.into(),
        }
    }

    pub fn parent_dir(&self) -> &Path {
        &self.parent_dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.parent_dir.join(&self.name)
    }

    pub fn remote_url(&self) -> String {
        format!("git@{}:{}/{}.git", self.host, self.organization, self.name)
    }

    pub fn remote_branch(&self) -> String {
        format!("origin/{}", self.branch)
    }
}

/// Why a repository could not be identified as a usable clone.
#[derive(Debug)]
pub enum ProbeError {
    /// The repository directory does not exist.
    Missing(PathBuf),
    /// The directory exists but the current branch cannot be determined.
    Unusable(BuildwatchError),
}

/// A tracked repository plus the runner used to execute git.
#[derive(Clone)]
pub struct GitRepo {
    handle: RepositoryHandle,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    pub fn new(handle: RepositoryHandle, runner: Arc<dyn CommandRunner>) -> Self {
        Self { handle, runner }
    }

    pub fn handle(&self) -> &RepositoryHandle {
        &self.handle
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.handle.repo_dir()
    }

    async fn git_in(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        let cmd = CommandSpec::new("git").args(args.iter().copied());
        self.runner.run(dir, &cmd).await
    }

    async fn git(&self, args: &[&str]) -> Result<CommandOutput> {
        self.git_in(&self.repo_dir(), args).await
    }

    /// `git remote update`.
    pub async fn update_remote(&self) -> Result<()> {
        self.git(&["remote", "update"]).await?;
        Ok(())
    }

    /// Resolve `reference` to a single commit id.
    pub async fn head_commit(&self, reference: &str) -> Result<String> {
        let output = self.git(&["rev-parse", reference]).await?;
        single_line(reference, output)
    }

    /// Most recent common ancestor of `a` and `b`.
    pub async fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        let output = self.git(&["merge-base", a, b]).await?;
        single_line(&format!("merge-base {a} {b}"), output)
    }

    /// Fetch remote refs and classify the tracked branch against its remote.
    pub async fn upstream_state(&self) -> Result<UpstreamState> {
        let branch = self.handle.branch();
        let remote_branch = self.handle.remote_branch();

        self.update_remote().await?;
        let local = self.head_commit(branch).await?;
        let remote = self.head_commit(&remote_branch).await?;
        let base = self.merge_base(branch, &remote_branch).await?;

        let state = UpstreamState::classify(&local, &remote, &base);
        debug!(
            repo = %self.handle.name(),
            %local,
            %remote,
            %base,
            ?state,
            "upstream state"
        );
        Ok(state)
    }

    /// True when the remote branch has commits the local branch can
    /// fast-forward to. Divergence is fatal.
    pub async fn has_upstream_change(&self) -> Result<bool> {
        match self.upstream_state().await? {
            UpstreamState::UpToDate | UpstreamState::PushNeeded => Ok(false),
            UpstreamState::PullNeeded => Ok(true),
            UpstreamState::Diverged => Err(BuildwatchError::DivergedHistory {
                repo: self.repo_dir(),
                branch: self.handle.branch().to_string(),
            }),
        }
    }

    /// Fresh clone when absent, otherwise [`pull`](Self::pull). Submodules
    /// are initialised and updated either way.
    pub async fn clone_repo(&self) -> Result<()> {
        if self.is_cloned().await {
            return self.pull().await;
        }

        let parent = self.handle.parent_dir();
        fs::create_dir_all(parent)?;

        let url = self.handle.remote_url();
        info!(repo = %self.handle.name(), %url, "cloning repository");
        self.git_in(parent, &["clone", url.as_str()]).await?;
        self.update_submodules().await
    }

    /// `git pull origin <branch>` followed by a submodule sync.
    pub async fn pull(&self) -> Result<()> {
        info!(repo = %self.handle.name(), branch = %self.handle.branch(), "pulling");
        self.git(&["pull", "origin", self.handle.branch()]).await?;
        self.update_submodules().await
    }

    async fn update_submodules(&self) -> Result<()> {
        self.git(&["submodule", "init"]).await?;
        self.git(&["submodule", "update"]).await?;
        Ok(())
    }

    pub async fn checkout_branch(&self) -> Result<()> {
        self.git(&["checkout", self.handle.branch()]).await?;
        Ok(())
    }

    /// Name of the checked-out branch, from the `* <name>` line of
    /// `git branch`.
    pub async fn current_branch(&self) -> Result<String> {
        let output = self.git(&["branch"]).await?;
        output
            .stdout
            .iter()
            .find_map(|line| {
                current_branch_re()
                    .captures(line)
                    .map(|caps| caps[1].to_string())
            })
            .ok_or_else(|| BuildwatchError::NoCurrentBranch(self.repo_dir()))
    }

    /// Determine whether this is a usable clone, keeping the reason when not.
    pub async fn probe(&self) -> std::result::Result<String, ProbeError> {
        let dir = self.repo_dir();
        if !dir.is_dir() {
            return Err(ProbeError::Missing(dir));
        }
        self.current_branch().await.map_err(ProbeError::Unusable)
    }

    /// Best-effort: any probe failure counts as "not cloned".
    pub async fn is_cloned(&self) -> bool {
        match self.probe().await {
            Ok(_) => true,
            Err(ProbeError::Missing(dir)) => {
                debug!(dir = %dir.display(), "repository directory not present");
                false
            }
            Err(ProbeError::Unusable(e)) => {
                debug!(repo = %self.handle.name(), error = %e, "repository not usable");
                false
            }
        }
    }
}

fn single_line(reference: &str, output: CommandOutput) -> Result<String> {
    match output.stdout.as_slice() {
        [line] => Ok(line.trim().to_string()),
        lines => Err(BuildwatchError::AmbiguousRef {
            reference: reference.to_string(),
            lines: lines.len(),
        }),
    }
}

fn current_branch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\*\s+(\S+)").expect("valid current-branch regex"))
}
