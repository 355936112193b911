use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use terseurl_storage::{AuthStore, OpContext, Permission};

use crate::output::{OutputFormat, json::print_json, permission_label};

pub fn run(
    store: &AuthStore,
    ctx: &OpContext,
    user: &str,
    shortened: &[String],
    needed: Permission,
    format: OutputFormat,
) -> Result<ExitCode> {
    let allowed = store.authorize(ctx, user, shortened, &needed)?;
    tracing::debug!("Authorization check for {} returned {}", user, allowed);

    if format.is_json() {
        print_json(&json!({
            "user": user,
            "shortened": shortened,
            "required": needed,
            "allowed": allowed,
        }))?;
    } else if allowed {
        println!("{} {} holds {}", "allowed:".green().bold(), user, permission_label(&needed));
    } else {
        println!("{} {} lacks {}", "denied:".red().bold(), user, permission_label(&needed));
    }

    Ok(if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
