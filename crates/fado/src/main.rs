//! fado CLI - relocation tables for MIPS overlays

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::run_command(&cli);
    std::process::exit(exit_code);
}
