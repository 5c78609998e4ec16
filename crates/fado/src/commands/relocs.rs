//! Relocation table command.

use std::io::Write;
use std::path::{Path, PathBuf};

use fado::{BuildOptions, Error, FormatOptions, Table, Warning};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Handle the `relocs` command.
pub fn cmd_relocs(
    inputs: &[PathBuf],
    output: Option<&Path>,
    name: Option<&str>,
    annotate: bool,
    strict: bool,
    silent: bool,
) -> i32 {
    let table = match generate(inputs, name, annotate, strict) {
        Ok(table) => table,
        Err(err) => {
            error!(error = %err, "relocation table generation failed");
            terminal::error(&err.to_string());
            return EXIT_FAILURE;
        }
    };

    if let Err(err) = write_output(output, &table.text) {
        error!(error = %err, "failed to write relocation table");
        terminal::error(&err.to_string());
        return EXIT_FAILURE;
    }

    if !silent {
        report(&table, output);
    }
    EXIT_SUCCESS
}

fn generate(
    inputs: &[PathBuf],
    name: Option<&str>,
    annotate: bool,
    strict: bool,
) -> fado::Result<Table> {
    let files = fado::read_inputs(inputs)?;
    let overlay_name = match name {
        Some(name) => name.to_string(),
        None => {
            let first = &files.first().ok_or(Error::NoInputs)?.path;
            fado::overlay_name_from_path(first).ok_or_else(|| Error::NoOverlayName {
                path: first.clone(),
            })?
        }
    };
    info!(overlay = %overlay_name, files = files.len(), "generating relocation table");

    let build_options = BuildOptions::new().with_strict(strict);
    let format_options = FormatOptions::new(overlay_name).with_annotations(annotate);
    fado::generate(&files, &build_options, &format_options)
}

/// Write the whole table in one step so a failed run leaves no partial file.
fn write_output(output: Option<&Path>, text: &str) -> fado::Result<()> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn report(table: &Table, output: Option<&Path>) {
    let unresolved = table
        .warnings
        .iter()
        .filter(|w| matches!(w, Warning::UnresolvedReference { .. }))
        .count();
    let invalid = table.warnings.len() - unresolved;
    if unresolved > 0 {
        terminal::warning(&format!(
            "{unresolved} relocation(s) reference symbols no input defines"
        ));
    }
    if invalid > 0 {
        terminal::warning(&format!(
            "{invalid} relocation(s) in sections other than text, data and rodata"
        ));
    }
    if let Some(path) = output {
        terminal::success(&format!("Wrote {} relocations", table.relocs));
        terminal::path_output(path);
    }
}
