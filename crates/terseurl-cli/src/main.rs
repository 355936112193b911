mod cli;
mod commands;
mod completions;
mod error;
mod output;
mod setup;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use terseurl_storage::AuthorizationStore;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => error::handle_error(err),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Completions { shell } = cli.command {
        completions::generate_completions(shell);
        return Ok(ExitCode::SUCCESS);
    }

    let config = setup::load_config(cli.config.as_deref(), cli.backend, cli.db_path)?;
    let store = setup::open_store(&config)?;
    let ctx = setup::op_context(cli.timeout);

    let outcome = commands::run(&store, &ctx, cli.command, cli.format);
    finish(outcome, store.close(&ctx).map_err(anyhow::Error::from))
}

/// The command's error wins; a close failure behind it is still logged.
fn finish(outcome: Result<ExitCode>, closed: Result<()>) -> Result<ExitCode> {
    match (outcome, closed) {
        (Ok(code), Ok(())) => Ok(code),
        (Ok(_), Err(close_err)) => Err(close_err.context("Failed to close authorization store")),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!("Failed to close authorization store: {:#}", close_err);
            Err(err)
        }
    }
}
