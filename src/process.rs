//! Child-process helpers for driving external tools.
//!
//! Everything this tool does ends in a child process: probing for tools,
//! creating the venv, running pip, running Meson. `Cmd` is a small builder
//! over `std::process::Command` with two run modes:
//!
//! - [`Cmd::run`] captures stdout/stderr for parsing (tool probes)
//! - [`Cmd::run_streamed`] inherits the terminal for long-running tools
//!   whose own output is the primary diagnostic surface (pip, meson)
//!
//! Non-zero exits become a typed [`CommandFailure`] inside the anyhow chain
//! so callers can recover the child's exit status.

use anyhow::{Context, Result};
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};
use thiserror::Error;

/// A command that ran to completion but exited unsuccessfully.
#[derive(Debug, Error)]
#[error("command `{program}` failed ({status})")]
pub struct CommandFailure {
    pub program: String,
    pub status: ExitStatus,
}

/// Captured result of a completed command.
#[derive(Debug)]
pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CmdResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Builder for one external command invocation.
pub struct Cmd {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    error_msg: Option<String>,
    allow_fail: bool,
}

impl Cmd {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            error_msg: None,
            allow_fail: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Message used as error context when the command exits non-zero.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    /// Treat a non-zero exit as a normal result instead of an error.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Run the command, capturing stdout and stderr.
    pub fn run(self) -> Result<CmdResult> {
        let program = self.program.display().to_string();
        let output: Output = self
            .command()
            .output()
            .with_context(|| format!("failed to run `{program}`"))?;

        let result = CmdResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() && !self.allow_fail {
            let msg = match &self.error_msg {
                Some(msg) => msg.clone(),
                None => format!("command `{program}` failed"),
            };
            // Captured stderr would otherwise be lost - attach it to the error.
            let msg = if result.stderr.trim().is_empty() {
                msg
            } else {
                format!("{msg}:\n{}", result.stderr.trim_end())
            };
            return Err(anyhow::Error::new(CommandFailure {
                program,
                status: result.status,
            })
            .context(msg));
        }

        Ok(result)
    }

    /// Run the command with stdout/stderr inherited from this process.
    pub fn run_streamed(self) -> Result<()> {
        let program = self.program.display().to_string();
        let status = self
            .command()
            .status()
            .with_context(|| format!("failed to run `{program}`"))?;

        if !status.success() && !self.allow_fail {
            let msg = match &self.error_msg {
                Some(msg) => msg.clone(),
                None => format!("command `{program}` failed"),
            };
            return Err(anyhow::Error::new(CommandFailure { program, status }).context(msg));
        }

        Ok(())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Locate a program on PATH. Returns the first executable hit.
pub fn which(program: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    for dir in env::split_paths(&path) {
        let candidate = dir.join(program);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        if cfg!(windows) {
            let candidate = dir.join(format!("{program}.exe"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Quick existence check for a tool on PATH.
pub fn exists(program: &str) -> bool {
    which(program).is_some()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
