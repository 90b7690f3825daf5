//! External tool execution.
//!
//! Terraform and SAM are driven as subprocesses. The [`Runner`] trait is the
//! seam that lets stage drivers be exercised against scripted output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, trace};

use crate::error::{Result, StageError};

/// A single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
    /// Extra environment for the child.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: dir.as_ref().to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
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

    /// First argument, i.e. the subcommand (`plan`, `deploy`, ...).
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// What to show the operator on failure: stderr, else stdout.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }

    /// Case-insensitive search across both streams.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.stderr.to_lowercase().contains(&needle) || self.stdout.to_lowercase().contains(&needle)
    }
}

/// Runs external tools.
pub trait Runner {
    /// Run to completion and capture output.
    ///
    /// A non-zero exit is not an error here; callers inspect the
    /// [`ToolOutput`] and decide.
    ///
    /// # Errors
    ///
    /// Returns `StageError::ToolNotFound` if the program is not installed,
    /// or `StageError::Spawn` if it cannot be started.
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

/// Runs tools as child processes of this one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let program = which::which(&invocation.program).map_err(|_| StageError::ToolNotFound {
            tool: invocation.program.clone(),
        })?;

        debug!(command = %invocation, dir = %invocation.dir.display(), "running");

        let output = Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.dir)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| StageError::Spawn {
                tool: invocation.program.clone(),
                source,
            })?;

        let result = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        trace!(
            command = %invocation,
            code = ?result.code,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "finished"
        );
        Ok(result)
    }
}

/// Runner replaying canned output, for driver tests.
///
/// Responses are matched by the start of the space-joined argument list.
/// When several responses share a prefix they are used in order and the
/// last one sticks. Unmatched invocations succeed with no output.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    responses: std::cell::RefCell<Vec<(String, ToolOutput)>>,
    calls: std::cell::RefCell<Vec<Invocation>>,
}

#[cfg(test)]
impl ScriptedRunner {
    pub(crate) fn respond(&self, prefix: &str, code: i32, stdout: &str, stderr: &str) -> &Self {
        self.responses.borrow_mut().push((
            prefix.to_string(),
            ToolOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Argument lines of every call, e.g. `"plan -input=false ..."`.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.args.join(" ")).collect()
    }
}

#[cfg(test)]
impl Runner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.args.join(" ");
        let mut responses = self.responses.borrow_mut();
        let matching: Vec<usize> = responses
            .iter()
            .enumerate()
            .filter(|(_, (prefix, _))| line.starts_with(prefix.as_str()))
            .map(|(i, _)| i)
            .collect();
        Ok(match matching.as_slice() {
            [] => ToolOutput {
                code: Some(0),
                ..ToolOutput::default()
            },
            [only] => responses[*only].1.clone(),
            [first, ..] => responses.remove(*first).1,
        })
    }
}
