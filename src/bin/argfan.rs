// src/bin/argfan.rs

use anyhow::{Context, Result};
use argfan::{
    cli::{Cli, print_help},
    core::{
        config_loader,
        launch_options::{LaunchError, LaunchOptions, find_config_path, find_quiet_level},
        plan_executor, planner,
    },
    system::{executor::ExecutionError, sources::SystemSources},
};
use clap::Parser;
use colored::*;

/// The main entry point of the `argfan` launcher.
fn main() {
    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if let Some(ExecutionError::Cancelled) = e.downcast_ref::<ExecutionError>() {
                eprintln!("{}", "Cancelled.".yellow());
                std::process::exit(1);
            }
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn level_for_quiet(quiet: u8) -> log::LevelFilter {
    match quiet {
        0 => log::LevelFilter::Warn,
        1 | 2 => log::LevelFilter::Error,
        _ => log::LevelFilter::Off,
    }
}

fn init_logging(quiet: u8) {
    let default_filter = level_for_quiet(quiet).to_string();
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .try_init();
}

fn run_cli(cli: Cli) -> Result<i32> {
    let flag_quiet = find_quiet_level(&cli.args);
    init_logging(flag_quiet);
    log::debug!("CLI args parsed: {:?}", cli);

    let config_path = find_config_path(&cli.args);
    let config = config_loader::load_config(config_path.as_deref())?;
    let options = LaunchOptions::parse_with_config(&cli.args, &config)?;
    // `always_quiet` from the config can only lower the level further.
    if options.quiet > flag_quiet && std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(level_for_quiet(options.quiet));
    }

    if options.show_help || cli.args.is_empty() {
        print_help().context("Failed to print help")?;
        return Ok(0);
    }
    let target = options.target.clone().ok_or(LaunchError::MissingTarget)?;

    let mut sources = SystemSources::new();
    let plan = planner::build_run_plan(
        &options.template,
        options.specifiers.clone(),
        &options.template_options(),
        &mut sources,
    )?;

    let settings = options.execution_settings()?;
    plan_executor::execute_plan(&target, &plan, &settings)
}
