//! The goldrun command-line interface.
//!
//! Parses arguments, sets up logging, and dispatches to the subcommand handlers.
//! Exit status: `0` when the run succeeds, `1` when any case fails, `2` when the
//! run could not start.

use std::process::ExitCode;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, GoldrunArgs, RunArgs, ScaffoldArgs};
use crate::config::HarnessConfig;
use crate::errors::{print_error, HarnessError};
use crate::fixtures::{load_fixture_list, FixtureWriter};
use crate::harness::Harness;
use crate::report::Reporter;

pub mod args;
pub mod output;

const EXIT_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

/// The main entry point for the CLI.
pub async fn run() -> ExitCode {
    let args = GoldrunArgs::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Command::Run(run) => handle_run(&run).await,
        Command::Scaffold(scaffold) => handle_scaffold(&scaffold),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            print_error(e);
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(default.into())
                .from_env_lossy(),
        )
        .init();
}

/// Handles the `run` subcommand. Returns whether the suite succeeded.
async fn handle_run(args: &RunArgs) -> Result<bool, HarnessError> {
    let mut config = HarnessConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    tracing::debug!(?config, "effective configuration");

    let harness = Harness::from_config(&config)?;
    let reporter = Reporter::new(output::format_for(&config), config.skip_policy);
    let summary = harness.run(reporter).await?;
    Ok(summary.is_success(config.skip_policy))
}

/// Handles the `scaffold` subcommand.
fn handle_scaffold(args: &ScaffoldArgs) -> Result<bool, HarnessError> {
    let fixtures = load_fixture_list(&args.list)?;
    let writer = FixtureWriter {
        dir: args.dir.clone(),
        prefix: args.prefix.clone(),
        suffix: args.suffix.clone(),
        force: args.force,
    };
    let written = writer.write_all(&fixtures)?;
    println!(
        "Created {} files inside the '{}' folder.",
        written.len(),
        args.dir.display()
    );
    Ok(true)
}
