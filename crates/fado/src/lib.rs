//! fado - relocation tables for MIPS overlays
//!
//! Reads the relocatable objects that make up an overlay and generates the
//! `.ovl` section the runtime overlay loader uses to relocate it.
//!
//! # Example
//!
//! ```ignore
//! use fado::{BuildOptions, FormatOptions};
//!
//! let inputs = fado::read_inputs(&["build/ovl_En_Test/z_en_test.o"])?;
//! let table = fado::generate(&inputs, &BuildOptions::new(), &FormatOptions::new("ovl_En_Test"))?;
//! print!("{}", table.text);
//! ```

pub mod dump;
mod error;
pub mod format;
mod name;
pub mod overlay;
mod word;

pub use error::{BuildError, Error, Result};
pub use format::{FormatOptions, TableLayout, render_table, write_table};
pub use name::overlay_name_from_path;
pub use overlay::{BuildOptions, InputFile, OverlayRelocs, PackedReloc, Warning, build};
pub use word::RelocWord;

use std::path::Path;

use fado_elf::ObjectFile;
use tracing::debug;

/// Parse an object already in memory.
pub fn parse_input(path: &Path, data: &[u8]) -> Result<InputFile> {
    let object = ObjectFile::parse(data).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(InputFile::new(path, object))
}

/// Read and parse one object file.
pub fn read_input(path: &Path) -> Result<InputFile> {
    let data = std::fs::read(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(file = %path.display(), size = data.len(), "read object");
    parse_input(path, &data)
}

/// Read the objects of an overlay, keeping their link order.
pub fn read_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<InputFile>> {
    if paths.is_empty() {
        return Err(Error::NoInputs);
    }
    paths.iter().map(|p| read_input(p.as_ref())).collect()
}

/// A rendered relocation table.
#[derive(Clone, Debug)]
pub struct Table {
    /// Assembly source of the `.ovl` section.
    pub text: String,
    /// Number of relocation words.
    pub relocs: usize,
    pub warnings: Vec<Warning>,
}

/// Build and render the relocation table of `inputs`.
pub fn generate(
    inputs: &[InputFile],
    build_options: &BuildOptions,
    format_options: &FormatOptions,
) -> Result<Table> {
    if inputs.is_empty() {
        return Err(Error::NoInputs);
    }
    let relocs = build(inputs, build_options)?;
    Ok(Table {
        text: render_table(&relocs, format_options)?,
        relocs: relocs.count(),
        warnings: relocs.warnings,
    })
}
