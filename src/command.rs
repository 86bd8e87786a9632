//! Command chains and the sub-command runner.
//!
//! A `cmd` string is split on `&&` into sub-commands. Each sub-command is
//! one of: a directory change (`cd <path>`), a background launch (trailing
//! `&`), a foreground command, or an empty segment, which is skipped.

use crate::context::ExecutionContext;
use crate::error::{Result, StepScriptError};
use crate::spawner::{ProcessSpawner, SpawnRequest};
use tracing::{debug, info, warn};

/// Split a raw command on `&&` and trim every piece.
///
/// Empty pieces are kept so callers can see them; the runner skips them.
pub fn split_chain(raw: &str) -> Vec<&str> {
    raw.split("&&").map(str::trim).collect()
}

/// A classified sub-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubCommand<'a> {
    Empty,
    ChangeDir(&'a str),
    Background { program: &'a str, args: Vec<String> },
    Foreground { program: &'a str, args: Vec<String> },
}

impl<'a> SubCommand<'a> {
    /// Classify a trimmed sub-command.
    ///
    /// Argument splitting is plain whitespace splitting; quotes are not
    /// interpreted here.
    pub fn parse(command: &'a str) -> Self {
        if command.is_empty() {
            return SubCommand::Empty;
        }
        if let Some(target) = command.strip_prefix("cd ") {
            return SubCommand::ChangeDir(target.trim());
        }
        if let Some(body) = command.strip_suffix('&') {
            return match split_words(body) {
                Some((program, args)) => SubCommand::Background { program, args },
                None => SubCommand::Empty,
            };
        }
        match split_words(command) {
            Some((program, args)) => SubCommand::Foreground { program, args },
            None => SubCommand::Empty,
        }
    }
}

fn split_words(text: &str) -> Option<(&str, Vec<String>)> {
    let mut words = text.split_whitespace();
    let program = words.next()?;
    Some((program, words.map(str::to_string).collect()))
}

/// Runs sub-commands against a working-directory context.
pub struct CommandRunner<'a, S: ProcessSpawner> {
    spawner: &'a S,
    context: &'a mut ExecutionContext,
}

impl<'a, S: ProcessSpawner> CommandRunner<'a, S> {
    pub fn new(spawner: &'a S, context: &'a mut ExecutionContext) -> Self {
        Self { spawner, context }
    }

    /// Run every sub-command of `raw` in order, stopping at the first failure.
    ///
    /// Returns one line per sub-command that produced a result; empty
    /// segments and `cd` to the current directory produce none.
    pub fn run_chain(&mut self, raw: &str) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for command in split_chain(raw) {
            if let Some(line) = self.run(command)? {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Run one trimmed sub-command.
    pub fn run(&mut self, command: &str) -> Result<Option<String>> {
        match SubCommand::parse(command) {
            SubCommand::Empty => {
                debug!("skipping empty sub-command");
                Ok(None)
            }
            SubCommand::ChangeDir(target) => match self.context.change_dir(target) {
                Some(dir) => {
                    info!(dir = %dir.display(), "changed working directory");
                    Ok(Some(format!("Changed directory to {}", dir.display())))
                }
                None => {
                    debug!(dir = target, "cd resolves to the current directory, nothing to do");
                    Ok(None)
                }
            },
            SubCommand::Background { program, args } => {
                let request = SpawnRequest {
                    program,
                    args: &args,
                    cwd: self.context.working_dir(),
                };
                let line = request.command_line();
                self.spawner
                    .launch_detached(&request)
                    .map_err(|source| StepScriptError::Spawn {
                        command: line.clone(),
                        source,
                    })?;
                info!(command = %line, "started background process");
                Ok(Some(format!("Started background process: {}", line)))
            }
            SubCommand::Foreground { program, args } => {
                let request = SpawnRequest {
                    program,
                    args: &args,
                    cwd: self.context.working_dir(),
                };
                info!(command, cwd = %request.cwd.display(), "running command");
                let code = self
                    .spawner
                    .run_foreground(&request)
                    .map_err(|source| StepScriptError::Spawn {
                        command: command.to_string(),
                        source,
                    })?;
                match code {
                    Some(0) => Ok(Some(format!(
                        "Command '{}' completed successfully (exit code 0)",
                        command
                    ))),
                    Some(code) => {
                        warn!(command, code, "command failed");
                        Err(StepScriptError::CommandFailed {
                            command: command.to_string(),
                            code,
                        })
                    }
                    None => {
                        warn!(command, "command terminated by signal");
                        Err(StepScriptError::CommandTerminated {
                            command: command.to_string(),
                        })
                    }
                }
            }
        }
    }
}
