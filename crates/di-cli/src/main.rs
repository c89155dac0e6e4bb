mod commands;
mod util;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "devinsight", about = "DevInsight: AI code review against an uploaded codebase")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,

    /// Print raw JSON instead of a formatted summary
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

/// Backend and gateway settings, all overridable from the environment.
#[derive(Args)]
pub struct Settings {
    /// Upstash-style REST endpoint for the cache store
    #[arg(long, global = true, env = "UPSTASH_REDIS_REST_URL", hide_env_values = true)]
    rest_url: Option<String>,

    /// Bearer token for the REST store
    #[arg(long, global = true, env = "UPSTASH_REDIS_REST_TOKEN", hide_env_values = true)]
    rest_token: Option<String>,

    /// Redis connection URL (used when no REST store is configured)
    #[arg(long, global = true, env = "REDIS_URL", hide_env_values = true)]
    redis_url: Option<String>,

    /// Per-operation store timeout in milliseconds
    #[arg(long, global = true, env = "DI_STORE_TIMEOUT_MS", default_value_t = 5000)]
    store_timeout_ms: u64,

    /// Google Generative Language API key
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model used for reviews
    #[arg(long, global = true, env = "GOOGLE_AI_MODEL", default_value = "gemini-2.5-pro")]
    model: String,

    /// Upper bound on a single analysis call, in seconds
    #[arg(long, global = true, env = "DI_GATEWAY_TIMEOUT_SECS", default_value_t = 120)]
    gateway_timeout_secs: u64,

    /// Maximum total size of an uploaded project, in bytes
    #[arg(long, global = true, env = "MAX_ZIP_SIZE", default_value_t = 52_428_800)]
    max_archive_bytes: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a project directory as a 24h review context
    Upload {
        /// Project root
        dir: PathBuf,
    },

    /// Show whether a context session exists and what it holds
    Info {
        /// Session id returned by `upload`
        session_id: String,
    },

    /// Review changes against an uploaded context
    Review {
        /// Session id returned by `upload`
        session_id: String,
        /// A .diff/.patch file, or a directory of changed files
        #[arg(long)]
        changes: PathBuf,
        /// What the change is meant to do
        #[arg(short, long)]
        description: String,
    },

    /// Review changes against a project directory without creating a session
    Quick {
        /// Project root
        dir: PathBuf,
        /// A .diff/.patch file, or a directory of changed files
        #[arg(long)]
        changes: PathBuf,
        /// What the change is meant to do
        #[arg(short, long)]
        description: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("di=warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Upload { dir } => commands::upload::run(&cli.settings, dir, cli.json).await,
        Commands::Info { session_id } => {
            commands::info::run(&cli.settings, session_id, cli.json).await
        }
        Commands::Review {
            session_id,
            changes,
            description,
        } => {
            commands::review::run(
                &cli.settings,
                commands::review::Target::Session(session_id),
                changes,
                description,
                cli.json,
            )
            .await
        }
        Commands::Quick {
            dir,
            changes,
            description,
        } => {
            commands::review::run(
                &cli.settings,
                commands::review::Target::Project(dir),
                changes,
                description,
                cli.json,
            )
            .await
        }
    }
}
