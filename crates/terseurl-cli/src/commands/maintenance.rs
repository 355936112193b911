use anyhow::Result;
use serde_json::json;
use terseurl_storage::{AuthStore, OpContext};

use crate::output::{OutputFormat, json::print_json};

pub fn verify(store: &AuthStore, ctx: &OpContext, format: OutputFormat) -> Result<()> {
    store.verify(ctx)?;

    if format.is_json() {
        return print_json(&json!({ "consistent": true }));
    }

    println!("Authorization index is consistent");
    Ok(())
}

pub fn rebuild(store: &AuthStore, ctx: &OpContext, format: OutputFormat) -> Result<()> {
    let indexed = store.rebuild_index(ctx)?;

    if format.is_json() {
        return print_json(&json!({ "rebuilt": true, "shortened_urls": indexed }));
    }

    println!("Rebuilt reverse index: {} shortened URLs", indexed);
    Ok(())
}

pub fn stats(store: &AuthStore, ctx: &OpContext, format: OutputFormat) -> Result<()> {
    let stats = store.stats(ctx)?;

    if format.is_json() {
        return print_json(&stats);
    }

    println!("Authorization store:");
    println!("  backend: {}", stats.backend);
    println!("  users: {}", stats.users);
    println!("  shortened_urls: {}", stats.shortened_urls);
    println!("  grants: {}", stats.grants);
    Ok(())
}
