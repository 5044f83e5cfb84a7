//! Blocking child-process execution for the container and encoder tools.
//!
//! Every external tool invocation goes through [`run_tool`]: the command
//! line is logged, stdout is piped and fully drained before waiting (a tool
//! writing into a full pipe would otherwise deadlock the run), and the exit
//! status comes back to the caller. Whether a run "worked" is decided by the
//! caller checking for the tool's expected output file, never by the exit
//! status alone.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{CoreError, CoreResult};
use crate::paths::quote;

/// Renders a program and its arguments as one shell-like line for logging.
#[must_use]
pub fn display_command(program: &Path, args: &[String]) -> String {
    let mut line = quote(&program.to_string_lossy());
    for arg in args {
        line.push(' ');
        if arg.contains(' ') {
            line.push_str(&quote(arg));
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Runs an external tool to completion, draining its standard output.
///
/// Blocks until the child exits. Returns the exit status, or an error when
/// the process could not be started or waited on.
pub fn run_tool(
    program: &Path,
    args: &[String],
    working_dir: Option<&Path>,
) -> CoreResult<ExitStatus> {
    log::info!("Running: {}", display_command(program, args));

    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped());
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| {
        CoreError::Process(format!("failed to start {}: {e}", program.display()))
    })?;

    // Drain stdout to the end before waiting; stopping early would leave the
    // child blocked on a full pipe.
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            match line {
                Ok(text) => log::debug!("STDOUT: {text}"),
                Err(e) => {
                    log::warn!("Error reading output of {}: {e}", program.display());
                    break;
                }
            }
        }
    }

    let status = child.wait().map_err(|e| {
        CoreError::Process(format!("error waiting for {}: {e}", program.display()))
    })?;
    if !status.success() {
        log::debug!("{} exited with {status}", program.display());
    }
    Ok(status)
}
