// src/core/plan_executor.rs

//! # Plan Executor
//!
//! Hands a finished [`RunPlan`] to the operating system: optional confirmation,
//! echo, dry-run, then sequential or bounded-parallel execution.

use crate::constants::CONFIRMATION_THRESHOLD;
use crate::core::commons::join_for_shell;
use crate::models::RunPlan;
use crate::system::executor::{self, ExecutionError, ProcessOptions};
use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use rayon::prelude::*;
use std::fmt::Write;
use std::path::PathBuf;

/// How the runs of a plan are carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Print each command line before running it.
    pub echo: bool,
    /// Never spawn anything.
    pub dry_run: bool,
    /// Join arguments without quoting and run them as one shell string.
    pub raw_command_line: bool,
    pub shell: bool,
    pub working_directory: Option<PathBuf>,
    pub parallel: bool,
    /// Upper bound on concurrent runs with `parallel`.
    pub limit: Option<usize>,
    pub quiet: u8,
    /// Skip the confirmation prompt for large plans.
    pub assume_yes: bool,
}

/// Prepends `target` to every run of `plan`.
pub fn command_lines(target: &str, plan: &RunPlan) -> Vec<Vec<String>> {
    plan.runs()
        .iter()
        .map(|run| {
            let mut argv = Vec::with_capacity(run.len() + 1);
            argv.push(target.to_string());
            argv.extend(run.iter().cloned());
            argv
        })
        .collect()
}

/// The text shown for one run.
pub fn display_line(argv: &[String], raw: bool) -> String {
    if raw {
        argv.join(" ")
    } else {
        join_for_shell(argv).unwrap_or_else(|| argv.join(" "))
    }
}

/// Executes every run of `plan` with `target` as the program.
///
/// Returns the exit code of the launcher: the run's own code for a single run,
/// otherwise 0 when every run succeeded and 1 when any failed.
pub fn execute_plan(target: &str, plan: &RunPlan, settings: &ExecutionSettings) -> Result<i32> {
    let argvs = command_lines(target, plan);

    if argvs.len() > CONFIRMATION_THRESHOLD && !settings.assume_yes && !settings.dry_run {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("About to start {} runs. Continue?", argvs.len()))
            .default(false)
            .interact()?;
        if !confirmed {
            return Err(ExecutionError::Cancelled.into());
        }
    }

    if settings.echo {
        print_runs(&argvs, settings);
    }
    if settings.dry_run {
        log::debug!("Dry run: {} run(s) not started.", argvs.len());
        return Ok(0);
    }

    let options = ProcessOptions {
        shell: settings.shell,
        raw_command_line: settings.raw_command_line,
        working_directory: settings.working_directory.as_deref(),
    };

    if let [argv] = argvs.as_slice() {
        let code = executor::execute_run(argv, &options)
            .with_context(|| format!("Failed to run '{}'", display_line(argv, true)))?;
        return Ok(code);
    }

    let results: Vec<Result<i32, ExecutionError>> = if settings.parallel {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.limit.unwrap_or(0))
            .build()
            .context("Failed to start the worker pool")?;
        log::trace!(
            "Running {} command(s) on {} worker(s).",
            argvs.len(),
            pool.current_num_threads()
        );
        pool.install(|| {
            argvs
                .par_iter()
                .map(|argv| executor::execute_run(argv, &options))
                .collect()
        })
    } else {
        argvs
            .iter()
            .map(|argv| executor::execute_run(argv, &options))
            .collect()
    };

    let mut failures = 0usize;
    for (argv, result) in argvs.iter().zip(results) {
        match result {
            Ok(0) => {}
            Ok(code) => {
                log::debug!("'{}' exited with {}.", display_line(argv, true), code);
                failures += 1;
            }
            Err(e) => {
                log::warn!("{}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        if settings.quiet == 0 {
            eprintln!(
                "{} {} of {} run(s) failed.",
                "!".yellow().bold(),
                failures,
                argvs.len()
            );
        }
        return Ok(1);
    }
    Ok(0)
}

fn print_runs(argvs: &[Vec<String>], settings: &ExecutionSettings) {
    if settings.parallel && argvs.len() > 1 && !settings.dry_run {
        let mut block = String::with_capacity(argvs.len() * 80);
        let _ = writeln!(
            block,
            "{}",
            format!("┌─ Running {} commands in parallel...", argvs.len()).dimmed()
        );
        let inter_arrow = "├─>".dimmed();
        for argv in argvs {
            let line = display_line(argv, settings.raw_command_line);
            let _ = writeln!(block, "{} {}", inter_arrow, line.green());
        }
        print!("{}", block);
        return;
    }
    for argv in argvs {
        let line = display_line(argv, settings.raw_command_line);
        println!("{} {}", "→".blue(), line.green());
    }
}
