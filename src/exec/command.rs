// src/exec/command.rs

//! One-shot external commands (git, cmake, make).
//!
//! Every command runs to completion in an explicit working directory with its
//! output fully buffered. A nonzero exit is always an error: callers never see
//! a partially successful command. Commands get their own process group, so a
//! terminal Ctrl-C does not interrupt an in-flight build.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{BuildwatchError, Result};

/// Program plus argument vector. Executed directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Prefix this command with a wrapper such as `["sudo"]`.
    ///
    /// An empty prefix leaves the command unchanged.
    pub fn wrapped(self, prefix: &[String]) -> Self {
        let Some((program, rest)) = prefix.split_first() else {
            return self;
        };
        let mut args: Vec<String> = rest.to_vec();
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: program.clone(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    /// Successful output with the given stdout lines.
    pub fn with_stdout<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code: 0,
            stdout: lines.into_iter().map(Into::into).collect(),
            stderr: Vec::new(),
        }
    }
}

/// Seam between the git/build adapters and process execution.
///
/// Production code uses [`RealCommandRunner`]; tests can provide a runner that
/// records commands and returns scripted output without spawning anything.
pub trait CommandRunner: Send + Sync {
    /// Run `command` inside `dir` and wait for it to finish.
    ///
    /// Must fail with [`BuildwatchError::CommandFailed`] on nonzero exit.
    fn run<'a>(
        &'a self,
        dir: &'a Path,
        command: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;
}

/// Runner that spawns real OS processes via `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run<'a>(
        &'a self,
        dir: &'a Path,
        command: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(run_command(dir, command))
    }
}

async fn run_command(dir: &Path, command: &CommandSpec) -> Result<CommandOutput> {
    info!(cmd = %command, dir = %dir.display(), "running command");

    let output = Command::new(&command.program)
        .args(&command.args)
        .current_dir(dir)
        .process_group(0)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    // Killed by a signal has no exit code.
    let code = output.status.code().unwrap_or(-1);
    let stdout = split_lines(&output.stdout);
    let stderr = split_lines(&output.stderr);

    debug!(
        cmd = %command,
        exit_code = code,
        stdout_lines = stdout.len(),
        stderr_lines = stderr.len(),
        "command finished"
    );

    if !output.status.success() {
        warn!(cmd = %command, exit_code = code, "command failed");
        return Err(BuildwatchError::CommandFailed {
            command: command.to_string(),
            code,
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput {
        code,
        stdout,
        stderr,
    })
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}
