use anyhow::{Result, bail};
use serde_json::json;
use terseurl_storage::{AuthStore, AuthorizationStore, OpContext};

use crate::cli::RevokeArgs;
use crate::output::{OutputFormat, json::print_json};

pub fn revoke_users(
    store: &AuthStore,
    ctx: &OpContext,
    args: RevokeArgs,
    format: OutputFormat,
) -> Result<()> {
    let users = targets(args, "user")?;
    store.delete_users(ctx, &users)?;
    report("users", &users, format)
}

pub fn revoke_shortened(
    store: &AuthStore,
    ctx: &OpContext,
    args: RevokeArgs,
    format: OutputFormat,
) -> Result<()> {
    let shortened = targets(args, "shortened URL")?;
    store.delete_shortened(ctx, &shortened)?;
    report("shortened URLs", &shortened, format)
}

/// An empty list wipes the store, so it has to be asked for with `--all`.
fn targets(args: RevokeArgs, noun: &str) -> Result<Vec<String>> {
    if args.all {
        return Ok(Vec::new());
    }
    if args.keys.is_empty() {
        bail!("Nothing to revoke: name at least one {} or pass --all", noun);
    }
    Ok(args.keys)
}

fn report(noun: &str, keys: &[String], format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(&json!({
            "revoked": true,
            "all": keys.is_empty(),
            "keys": keys,
        }));
    }

    if keys.is_empty() {
        println!("Removed all authorization data");
    } else {
        println!("Revoked {} {}: {}", keys.len(), noun, keys.join(", "));
    }
    Ok(())
}
