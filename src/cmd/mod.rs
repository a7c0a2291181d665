//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], or [`health`]. Each
//! handler lives in its own submodule.

pub mod health;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::RelayError;

pub async fn dispatch(cli: Cli) -> Result<(), RelayError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  lightrelay v{version} \u{2014} allowlisted CORS forwarding proxy\n\n  \
         No command provided. To get started:\n\n    \
         lightrelay run                    Start the proxy on 0.0.0.0:8081\n    \
         lightrelay validate               Check LR_* settings without starting\n    \
         lightrelay health                 Probe a running instance\n    \
         lightrelay --help                 See all commands and options\n"
    );
}
