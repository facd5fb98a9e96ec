//! image-harness - container image test and release harness CLI
//!
//! Subcommands:
//! - `test`: run image test scenarios for one version/os/architecture
//! - `update-dependencies`: update manifest version variables

use clap::Parser;
use image_harness::cli::{CliArgs, Command, TestArgs, UpdateArgs};
use image_harness::engine::ContainerEngine;
use image_harness::http::HttpClient;
use image_harness::orchestrator::Orchestrator;
use image_harness::output::{create_formatter, OutputConfig};
use image_harness::progress::Progress;
use image_harness::scenario::TestRunner;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; RUST_LOG overrides the level chosen by the flags
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("image_harness={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Colors only when writing to a terminal
fn output_config(json: bool, verbose: bool, quiet: bool) -> OutputConfig {
    OutputConfig::from_cli(json, verbose, quiet).with_color(io::stdout().is_terminal())
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    tracing::debug!("image-harness v{}", env!("CARGO_PKG_VERSION"));

    match &args.command {
        Command::Test(test) => run_tests(test, args.verbose, args.quiet).await,
        Command::UpdateDependencies(update) => update_dependencies(update, args.verbose, args.quiet),
    }
}

async fn run_tests(args: &TestArgs, verbose: bool, quiet: bool) -> anyhow::Result<ExitCode> {
    let categories = args.categories()?;
    let config = args.to_config();
    tracing::debug!(?config, ?categories, "test configuration");

    let engine = ContainerEngine::new(&config.engine);
    let client = HttpClient::new()?;
    let show_progress = !quiet && !args.json && io::stderr().is_terminal();

    let report = TestRunner::new(&engine, &client, &config)
        .with_progress(Progress::new(show_progress))
        .run(&categories)
        .await;

    let formatter = create_formatter(&output_config(args.json, verbose, quiet));
    let mut stdout = io::stdout().lock();
    formatter.format_report(&report, &mut stdout)?;
    stdout.flush()?;

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn update_dependencies(args: &UpdateArgs, verbose: bool, quiet: bool) -> anyhow::Result<ExitCode> {
    let show_progress = !quiet && !args.json && io::stderr().is_terminal();
    let result = Orchestrator::new(args)
        .with_progress(show_progress)
        .run()?;

    let formatter = create_formatter(&output_config(args.json, verbose, quiet));
    let mut stdout = io::stdout().lock();
    formatter.format_update(&result, &mut stdout)?;
    stdout.flush()?;

    Ok(if result.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
