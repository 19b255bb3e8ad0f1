// src/system/executor.rs

use crate::core::commons::join_for_shell;
use std::ffi::OsStr;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] std::io::Error),
    #[error("Command '{command}' exited with status {code}.")]
    NonZeroExitStatus { command: String, code: i32 },
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Operation cancelled by user.")]
    Cancelled,
}

impl ExecutionError {
    /// True when the program itself could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CommandFailed(_, e) if e.kind() == ErrorKind::NotFound)
    }
}

/// How a single run is handed to the operating system.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions<'a> {
    /// Run through the platform shell (`sh -c` / `cmd /C`).
    pub shell: bool,
    /// Join the arguments without any quoting and run the result through the shell.
    pub raw_command_line: bool,
    pub working_directory: Option<&'a Path>,
}

fn platform_shell(command_line: &str) -> StdCommand {
    if cfg!(target_os = "windows") {
        let mut command = StdCommand::new("cmd");
        command.arg("/C").arg(command_line);
        command
    } else {
        let mut command = StdCommand::new("sh");
        command.arg("-c").arg(command_line);
        command
    }
}

/// Runs one argument vector to completion with inherited stdio and returns its exit code.
pub fn execute_run(argv: &[String], options: &ProcessOptions<'_>) -> Result<i32, ExecutionError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ExecutionError::EmptyCommand);
    };

    let command_line = if options.raw_command_line {
        argv.join(" ")
    } else {
        join_for_shell(argv).ok_or_else(|| ExecutionError::CommandParse(argv.join(" ")))?
    };

    let mut command = if options.shell || options.raw_command_line {
        platform_shell(&command_line)
    } else {
        let mut command = StdCommand::new(program);
        command.args(args);
        command
    };
    if let Some(cwd) = options.working_directory {
        command.current_dir(dunce::simplified(cwd));
    }
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let status = match command.status() {
        Ok(status) => status,
        // Windows built-ins such as `echo` only exist inside cmd.
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("Command '{}' not found. Retrying with cmd /C.", program);
            let mut fallback = platform_shell(&command_line);
            if let Some(cwd) = options.working_directory {
                fallback.current_dir(dunce::simplified(cwd));
            }
            fallback
                .status()
                .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?
        }
        Err(e) => return Err(ExecutionError::CommandFailed(command_line, e)),
    };

    let code = status.code().unwrap_or(1);
    log::debug!("'{}' exited with {}.", command_line, code);
    Ok(code)
}

/// Runs `program` and returns its standard output split into lines.
///
/// With `stdin_lines`, the lines are written to the child's stdin (one per line);
/// otherwise stdin is inherited. Stderr is passed through to the terminal.
pub fn capture_output_lines(
    program: &OsStr,
    args: &[String],
    stdin_lines: Option<&[String]>,
) -> Result<Vec<String>, ExecutionError> {
    capture_output_lines_with_env(program, args, &[], stdin_lines)
}

/// Like [`capture_output_lines`], with extra environment variables for the child.
pub fn capture_output_lines_with_env(
    program: &OsStr,
    args: &[String],
    envs: &[(&str, &str)],
    stdin_lines: Option<&[String]>,
) -> Result<Vec<String>, ExecutionError> {
    let display = format!("{} {}", program.to_string_lossy(), args.join(" "))
        .trim()
        .to_string();

    let mut command = StdCommand::new(program);
    command
        .args(args)
        .envs(envs.iter().copied())
        .stdin(if stdin_lines.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    let mut child = command
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(display.clone(), e))?;

    // Feed stdin from a separate thread so a chatty child cannot deadlock us.
    let writer = match (stdin_lines, child.stdin.take()) {
        (Some(lines), Some(mut stdin)) => {
            let payload = if lines.is_empty() {
                String::new()
            } else {
                format!("{}\n", lines.join("\n"))
            };
            Some(std::thread::spawn(move || stdin.write_all(payload.as_bytes())))
        }
        _ => None,
    };

    let output = child
        .wait_with_output()
        .map_err(|e| ExecutionError::CommandFailed(display.clone(), e))?;

    if let Some(handle) = writer {
        match handle.join() {
            Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => {
                log::warn!("Could not write the list to '{}': {}", display, e);
            }
            _ => {}
        }
    }

    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: display,
            code: output.status.code().unwrap_or(1),
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: display.clone(),
        source: e,
    })?;
    Ok(stdout.lines().map(|line| line.trim_end().to_string()).collect())
}
