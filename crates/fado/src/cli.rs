//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "fado")]
#[command(about = "Generates relocation tables for MIPS overlays")]
#[command(version)]
pub struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level when `RUST_LOG` does not say otherwise.
    pub const fn log_level(&self) -> LevelFilter {
        if self.silent {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the relocation table of an overlay
    Relocs {
        /// Object files of the overlay, in link order
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (stdout if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overlay name (defaults to the directory of the first input)
        #[arg(long)]
        name: Option<String>,

        /// Emit bare words without decoding comments
        #[arg(long)]
        no_comments: bool,

        /// Fail on relocations of sections other than text, data and rodata
        #[arg(long)]
        strict: bool,
    },
    /// Print the contents of an object file
    Dump {
        /// What to print
        #[arg(value_enum)]
        kind: DumpKind,

        /// Input object file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

/// Listing printed by `dump`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DumpKind {
    /// Section header table
    Sections,
    /// Symbol table
    Symbols,
    /// Relocation sections
    Relocs,
}
