//! Command dispatch: bridges CLI args -> core entry points -> output formatting.

pub mod cache;
pub mod check;
pub mod config_cmd;
pub mod sync;

use crate::cli::{Command, GlobalOpts};
use crate::config::Loaded;
use crate::error::CliError;

/// Dispatch a config-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, loaded: &Loaded, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sync(args) => sync::handle(&args, loaded, global).await,
        Command::Check(args) => check::handle(&args, loaded, global).await,
        Command::Cache(args) => cache::handle(&args, loaded, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
