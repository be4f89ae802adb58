//! Command dispatch: bridges CLI args -> kiosk-core -> output formatting.

pub mod config_cmd;
pub mod fetch;
pub mod prices;
pub mod resolve;
pub mod run;
pub mod topic;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a display-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(args, global).await,
        Command::Fetch => fetch::handle(global).await,
        Command::Resolve(args) => resolve::handle(args, global).await,
        Command::Prices(args) => prices::handle(args, global).await,
        Command::Topic => topic::handle(global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "not a display command".into(),
        }),
    }
}
