use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use buildwatch::errors::{BuildwatchError, Result};
use buildwatch::exec::{CommandOutput, CommandRunner, CommandSpec};

/// A command the scripted runner was asked to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub dir: PathBuf,
    pub command: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    Fail(i32),
}

#[derive(Debug)]
struct Rule {
    prefix: String,
    /// Replies in order; the last one repeats forever.
    replies: VecDeque<Reply>,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    recorded: Vec<RecordedCommand>,
}

/// A fake runner that:
/// - records every command with its working directory
/// - answers from rules matched by command-text prefix (latest rule wins)
/// - succeeds with empty output when no rule matches.
///
/// Clones share state, so keep one clone for assertions and hand another to
/// the code under test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    state: Arc<Mutex<State>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_runner(&self) -> Arc<dyn CommandRunner> {
        Arc::new(self.clone())
    }

    /// Always answer commands starting with `prefix` with these stdout lines.
    pub fn respond(&self, prefix: &str, stdout: &[&str]) -> &Self {
        self.push_rule(prefix, vec![Reply::Output(CommandOutput::with_stdout(
            stdout.iter().copied(),
        ))]);
        self
    }

    /// Answer successive matching commands with successive outputs.
    pub fn respond_seq(&self, prefix: &str, outputs: &[&[&str]]) -> &Self {
        let replies = outputs
            .iter()
            .map(|lines| Reply::Output(CommandOutput::with_stdout(lines.iter().copied())))
            .collect();
        self.push_rule(prefix, replies);
        self
    }

    /// Fail commands starting with `prefix` with exit code `code`.
    pub fn fail(&self, prefix: &str, code: i32) -> &Self {
        self.push_rule(prefix, vec![Reply::Fail(code)]);
        self
    }

    fn push_rule(&self, prefix: &str, replies: Vec<Reply>) {
        let mut state = self.state.lock().unwrap();
        state.rules.push(Rule {
            prefix: prefix.to_string(),
            replies: replies.into(),
        });
    }

    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.state.lock().unwrap().recorded.clone()
    }

    /// Command texts in execution order.
    pub fn commands(&self) -> Vec<String> {
        self.recorded().into_iter().map(|r| r.command).collect()
    }

    /// How many executed commands start with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn answer(&self, dir: &Path, command: &CommandSpec) -> Result<CommandOutput> {
        let text = command.to_string();
        let mut state = self.state.lock().unwrap();
        state.recorded.push(RecordedCommand {
            dir: dir.to_path_buf(),
            command: text.clone(),
        });

        let reply = state
            .rules
            .iter_mut()
            .rev()
            .find(|rule| text.starts_with(&rule.prefix))
            .and_then(|rule| {
                if rule.replies.len() > 1 {
                    rule.replies.pop_front()
                } else {
                    rule.replies.front().cloned()
                }
            });

        match reply {
            None => Ok(CommandOutput::default()),
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Fail(code)) => Err(BuildwatchError::CommandFailed {
                command: text,
                code,
                stdout: Vec::new(),
                stderr: Vec::new(),
            }),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(
        &'a self,
        dir: &'a Path,
        command: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        let result = self.answer(dir, command);
        Box::pin(async move { result })
    }
}
