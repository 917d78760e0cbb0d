//! Command-line interface definitions using clap derive macros.
//!
//! The exporter is configured entirely through environment variables (see
//! [`crate::config`]); the CLI only selects what to do with them. Running
//! without a subcommand is the same as `redis_exporter run`.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "redis_exporter",
    version,
    about = "Prometheus exporter for Redis and Tile38 with push gateway publishing",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        redis_exporter                                   Serve with defaults\n  \
        REDIS_ADDR=redis://cache:6379 redis_exporter run Scrape a specific instance\n  \
        redis_exporter check                             Validate the environment\n\n  \
        All settings are read from environment variables (REDIS_ADDR, LISTEN_ADDRESS,\n  \
        METRIC_PATH, PUSH_GATEWAY_ADDR, ...)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the exporter (default)
    Run,

    /// Validate the environment configuration without starting
    Check(CheckArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Output format
    #[arg(long, default_value = "text")]
    pub format: CheckFormat,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum CheckFormat {
    Text,
    Json,
}
