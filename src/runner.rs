use std::process::Command;

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::command::BatchCommand;
use crate::error::PipelineError;
use crate::fs_util;

pub const BATCH_FAILURE_MARKER: &str = "ACTSEEK_BATCH_FAILED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait CommandRunner {
    fn run(&self, command: &BatchCommand) -> Result<CommandOutput, PipelineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &BatchCommand) -> Result<CommandOutput, PipelineError> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .map_err(|err| PipelineError::CommandLaunch {
                program: command.program.clone(),
                message: err.to_string(),
            })?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RunOutcome {
    Succeeded,
    Failed { code: Option<i32> },
}

pub struct BatchRunner<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> BatchRunner<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs the command once and overwrites `result_log` with what it
    /// printed. A non-zero exit is returned as `RunOutcome::Failed`, not as
    /// an error.
    pub fn run(
        &self,
        command: &BatchCommand,
        result_log: &Utf8Path,
    ) -> Result<RunOutcome, PipelineError> {
        info!(program = %command.program, args = command.args.len(), "starting ActSeek batch run");
        let output = self.runner.run(command)?;

        if output.success() {
            fs_util::write_atomic(result_log, output.stdout.as_bytes())?;
            info!(log = %result_log, "ActSeek run complete");
            return Ok(RunOutcome::Succeeded);
        }

        warn!(code = ?output.code, log = %result_log, "ActSeek batch mode failed");
        fs_util::write_atomic(result_log, failure_log(&output).as_bytes())?;
        Ok(RunOutcome::Failed { code: output.code })
    }
}

pub fn failure_log(output: &CommandOutput) -> String {
    format!(
        "{BATCH_FAILURE_MARKER}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}\n",
        output.stdout, output.stderr
    )
}
