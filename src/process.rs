//! The single seam through which the crate starts other programs.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, error};

#[cfg(test)]
use mockall::automock;

use crate::error::{ExtractorError, Result};

/// What an external program left behind once it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short description of a failed run for error messages.
    pub fn failure_summary(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExternalProcess: Send + Sync {
    /// Runs the program with `args` and waits for it to exit.
    async fn run(&self, args: &[OsString]) -> Result<ProcessOutput>;
}

/// A program on disk, optionally with leading arguments
/// (`node script.js` is program `node` with prefix `script.js`).
#[derive(Debug, Clone)]
pub struct SystemProcess {
    program: PathBuf,
    prefix: Vec<OsString>,
}

impl SystemProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }

    pub fn with_prefix_arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.prefix.push(arg.as_ref().to_os_string());
        self
    }
}

#[async_trait]
impl ExternalProcess for SystemProcess {
    async fn run(&self, args: &[OsString]) -> Result<ProcessOutput> {
        let program = self.program.display().to_string();
        debug!(program = %program, prefix = ?self.prefix, ?args, "Running external program");

        let output = Command::new(&self.program)
            .args(&self.prefix)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                error!(error = ?e, program = %program, "Failed to launch external program");
                match e.kind() {
                    io::ErrorKind::NotFound => ExtractorError::ToolNotFound {
                        program: program.clone(),
                    },
                    _ => ExtractorError::Spawn {
                        program: program.clone(),
                        source: e,
                    },
                }
            })?;

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program = %program, exit_code = ?result.exit_code, "External program finished");
        Ok(result)
    }
}

/// Converts anything path-like into the argument vector expected by [`ExternalProcess::run`].
pub fn os_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().map(|a| a.as_ref().to_os_string()).collect()
}
