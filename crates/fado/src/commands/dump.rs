//! Object file dump command.

use std::io::Write;
use std::path::Path;

use fado::Error;
use fado::dump::{write_relocs, write_sections, write_symbols};
use tracing::error;

use crate::cli::{DumpKind, EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Handle the `dump` command.
pub fn cmd_dump(kind: DumpKind, input: &Path) -> i32 {
    match dump(kind, input) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            error!(error = %err, "dump failed");
            terminal::error(&err.to_string());
            EXIT_FAILURE
        }
    }
}

fn dump(kind: DumpKind, input: &Path) -> fado::Result<()> {
    let data = std::fs::read(input).map_err(|source| Error::File {
        path: input.to_path_buf(),
        source,
    })?;
    let file = fado::parse_input(input, &data)?.object;

    let mut out = Vec::new();
    match kind {
        DumpKind::Sections => write_sections(&mut out, &file)?,
        DumpKind::Symbols => write_symbols(&mut out, &file)?,
        DumpKind::Relocs => write_relocs(&mut out, &file, &data)?,
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&out)?;
    stdout.flush()?;
    Ok(())
}
