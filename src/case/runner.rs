//! Execution of CIME commands.

use crate::case::cime::CimeCommand;
use crate::{Error, Result};
use std::process::{Command, Stdio};

/// Something that can run a CIME command to completion.
///
/// A non-zero exit must come back as [`Error::ToolFailed`] so the caller
/// stops before the next step.
pub trait CommandRunner {
    fn run(&mut self, cmd: &CimeCommand) -> Result<()>;
}

/// Runs commands as child processes, inheriting stdio so tool output shows
/// up live in the terminal.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, cmd: &CimeCommand) -> Result<()> {
        let mut command = Command::new(cmd.program());
        command
            .args(cmd.args())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = cmd.cwd() {
            command.current_dir(dir);
        }

        tracing::info!(command = %cmd.display(), "running");
        let status = command
            .status()
            .map_err(|e| Error::Other(format!("Failed to run {}: {}", cmd.display(), e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed {
                command: cmd.display(),
                code: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Records commands instead of running them.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub commands: Vec<CimeCommand>,
    /// Fail with this exit code when the n-th command (0-based) runs
    pub fail_at: Option<(usize, i32)>,
}

#[cfg(test)]
impl CommandRunner for RecordingRunner {
    fn run(&mut self, cmd: &CimeCommand) -> Result<()> {
        let index = self.commands.len();
        self.commands.push(cmd.clone());
        match self.fail_at {
            Some((at, code)) if at == index => Err(Error::ToolFailed {
                command: cmd.display(),
                code,
            }),
            _ => Ok(()),
        }
    }
}
