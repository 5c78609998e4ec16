//! Command implementations.

mod dump;
mod relocs;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Relocs {
            inputs,
            output,
            name,
            no_comments,
            strict,
        } => relocs::cmd_relocs(
            inputs,
            output.as_deref(),
            name.as_deref(),
            !*no_comments,
            *strict,
            cli.silent,
        ),
        Commands::Dump { kind, input } => dump::cmd_dump(*kind, input),
    }
}
