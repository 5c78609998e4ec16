use std::path::PathBuf;

use fado_elf::{FileFormatError, SectionClass};
use thiserror::Error;

/// Overlay tool errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Format {
        path: PathBuf,
        source: FileFormatError,
    },
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("ELF error: {0}")]
    Elf(#[from] FileFormatError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no input files")]
    NoInputs,
    #[error("cannot derive an overlay name from {}, pass --name", path.display())]
    NoOverlayName { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Relocation table build errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("{}: relocation at 0x{offset:x} uses symbol {index}, file has {count}", path.display())]
    SymbolOutOfRange {
        path: PathBuf,
        offset: u32,
        index: u32,
        count: usize,
    },
    #[error("{}: {source}", path.display())]
    SymbolName {
        path: PathBuf,
        source: FileFormatError,
    },
    #[error("{}: unknown MIPS relocation type {code} at 0x{offset:x}", path.display())]
    UnknownRelocType {
        path: PathBuf,
        offset: u32,
        code: u8,
    },
    #[error("{}: {class} relocation offset 0x{offset:x} does not fit in 24 bits", path.display())]
    OffsetOverflow {
        path: PathBuf,
        class: SectionClass,
        offset: u64,
    },
    #[error("{}: '{symbol}' relocation at 0x{offset:x} has no section class", path.display())]
    InvalidSectionClass {
        path: PathBuf,
        offset: u32,
        symbol: String,
    },
}
