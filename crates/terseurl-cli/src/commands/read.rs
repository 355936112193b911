use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use terseurl_storage::{AuthStore, AuthorizationStore, OpContext, Permission};

use crate::output::table::{grant_table, print_table};
use crate::output::{OutputFormat, json::print_json};

type SortedGrants = BTreeMap<String, BTreeMap<String, Permission>>;

fn sorted(grants: HashMap<String, HashMap<String, Permission>>) -> SortedGrants {
    grants
        .into_iter()
        .map(|(key, inner)| (key, inner.into_iter().collect()))
        .collect()
}

pub fn show_users(
    store: &AuthStore,
    ctx: &OpContext,
    users: &[String],
    format: OutputFormat,
) -> Result<()> {
    let grants = sorted(store.read_users(ctx, users)?);

    if format.is_json() {
        return print_json(&grants);
    }
    if grants.is_empty() {
        println!("No authorization data");
        return Ok(());
    }

    print_table(grant_table("User", "Shortened URL", &grants))
}

pub fn show_shortened(
    store: &AuthStore,
    ctx: &OpContext,
    shortened: &[String],
    format: OutputFormat,
) -> Result<()> {
    let grants = sorted(store.read_shortened(ctx, shortened)?);

    if format.is_json() {
        return print_json(&grants);
    }
    if grants.is_empty() {
        println!("No authorization data");
        return Ok(());
    }

    print_table(grant_table("Shortened URL", "User", &grants))
}
