use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use terseurl_storage::Permission;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "terseurl-authz")]
#[command(version, about = "TerseURL - authorization data maintenance")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store config file (defaults to ~/.terseurl/authorization.toml)
    #[arg(long, global = true, env = "TERSEURL_AUTHZ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend to use: memory or redb
    #[arg(long, global = true, env = "TERSEURL_AUTHZ_BACKEND")]
    pub backend: Option<String>,

    /// Database path for the redb backend
    #[arg(long, global = true, env = "TERSEURL_AUTHZ_PATH")]
    pub db_path: Option<String>,

    /// Abort an operation that takes longer than this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Grant a user permissions on a shortened URL, keeping their other grants
    Grant {
        user: String,
        shortened: String,

        #[command(flatten)]
        permission: PermissionArgs,
    },

    /// Replace every permission a user holds
    Replace {
        user: String,

        /// JSON object of shortened URL to permission,
        /// e.g. '{"abc":{"owner":true}}'
        permissions: String,
    },

    /// Remove users and everything they hold
    RevokeUsers(RevokeArgs),

    /// Remove every user's permissions on shortened URLs
    RevokeShortened(RevokeArgs),

    /// Show the permissions held by users (all users if none named)
    Users { users: Vec<String> },

    /// Show who holds permissions on shortened URLs (all if none named)
    Shortened { shortened: Vec<String> },

    /// Check a user's permissions; exits with status 1 when denied
    Check {
        user: String,

        /// Shortened URLs to check (every URL the user holds if none named)
        shortened: Vec<String>,

        #[command(flatten)]
        permission: PermissionArgs,
    },

    /// Check the reverse index against stored permissions
    Verify,

    /// Rebuild the reverse index from stored permissions
    Rebuild,

    /// Show store statistics
    Stats,
}

#[derive(Args, Clone, Copy, Debug, Default)]
pub struct PermissionArgs {
    /// Full control over the shortened URL
    #[arg(long)]
    pub owner: bool,

    /// View the shortened URL summary
    #[arg(long)]
    pub read_summary: bool,

    /// View visit statistics
    #[arg(long)]
    pub read_visits: bool,

    /// Modify the shortened URL
    #[arg(long)]
    pub write_terse: bool,
}

impl From<PermissionArgs> for Permission {
    fn from(args: PermissionArgs) -> Self {
        Permission {
            owner: args.owner,
            read_summary: args.read_summary,
            read_visits: args.read_visits,
            write_terse: args.write_terse,
        }
    }
}

#[derive(Args)]
pub struct RevokeArgs {
    /// Keys to revoke
    pub keys: Vec<String>,

    /// Remove all authorization data
    #[arg(long, conflicts_with = "keys")]
    pub all: bool,
}
