mod check;
mod grant;
mod maintenance;
mod read;
mod revoke;

use std::process::ExitCode;

use anyhow::Result;
use terseurl_storage::{AuthStore, OpContext};

use crate::cli::Commands;
use crate::completions;
use crate::output::OutputFormat;

pub fn run(
    store: &AuthStore,
    ctx: &OpContext,
    command: Commands,
    format: OutputFormat,
) -> Result<ExitCode> {
    match command {
        Commands::Completions { shell } => completions::generate_completions(shell),
        Commands::Grant {
            user,
            shortened,
            permission,
        } => grant::grant(store, ctx, user, shortened, permission.into(), format)?,
        Commands::Replace { user, permissions } => {
            grant::replace(store, ctx, user, &permissions, format)?
        }
        Commands::RevokeUsers(args) => revoke::revoke_users(store, ctx, args, format)?,
        Commands::RevokeShortened(args) => revoke::revoke_shortened(store, ctx, args, format)?,
        Commands::Users { users } => read::show_users(store, ctx, &users, format)?,
        Commands::Shortened { shortened } => read::show_shortened(store, ctx, &shortened, format)?,
        Commands::Check {
            user,
            shortened,
            permission,
        } => return check::run(store, ctx, &user, &shortened, permission.into(), format),
        Commands::Verify => maintenance::verify(store, ctx, format)?,
        Commands::Rebuild => maintenance::rebuild(store, ctx, format)?,
        Commands::Stats => maintenance::stats(store, ctx, format)?,
    }

    Ok(ExitCode::SUCCESS)
}
