use anyhow::{Context, Result};
use serde_json::json;
use terseurl_storage::{AuthStore, AuthorizationStore, OpContext, Permission, UserBatch, UserPermissions};

use crate::output::{OutputFormat, json::print_json, permission_label};

pub fn grant(
    store: &AuthStore,
    ctx: &OpContext,
    user: String,
    shortened: String,
    permission: Permission,
    format: OutputFormat,
) -> Result<()> {
    let row: UserPermissions = [(shortened.clone(), permission)].into_iter().collect();
    let batch: UserBatch = [(user.clone(), row)].into_iter().collect();
    store.append(ctx, batch)?;

    if format.is_json() {
        return print_json(&json!({
            "granted": true,
            "user": user,
            "shortened": shortened,
            "permission": permission,
        }));
    }

    println!(
        "Granted {} on {}: {}",
        user,
        shortened,
        permission_label(&permission)
    );
    Ok(())
}

pub fn replace(
    store: &AuthStore,
    ctx: &OpContext,
    user: String,
    raw_permissions: &str,
    format: OutputFormat,
) -> Result<()> {
    let permissions: UserPermissions = serde_json::from_str(raw_permissions)
        .context("Permissions must be a JSON object of shortened URL to permission")?;
    let count = permissions.len();

    let batch: UserBatch = [(user.clone(), permissions)].into_iter().collect();
    store.overwrite(ctx, batch)?;

    if format.is_json() {
        return print_json(&json!({
            "replaced": true,
            "user": user,
            "shortened_urls": count,
        }));
    }

    println!("Replaced permissions for {}: {} shortened URLs", user, count);
    Ok(())
}
