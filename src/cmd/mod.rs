//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to [`run`] (also the
//! default when no subcommand is given) or [`check`].

pub mod check;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::config::ProcessEnv;
use crate::error::ExporterError;

pub async fn dispatch(cli: Cli) -> Result<(), ExporterError> {
    match cli.command {
        Some(Commands::Run) | None => run::execute().await,
        Some(Commands::Check(ref args)) => check::execute(args, &ProcessEnv),
    }
}
