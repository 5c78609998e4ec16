//! Reader for big-endian ELF32 MIPS relocatable objects.
//!
//! Reads only what an overlay relocation table needs: the file header, the
//! section table, `.symtab`, `.strtab` and the `SHT_REL` sections of the
//! text, data and rodata classes.

mod class;
mod constants;
mod file;
mod header;
mod read;
mod reloc;
mod strtab;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use class::*;
pub use constants::*;
pub use file::*;
pub use header::*;
pub use read::*;
pub use reloc::*;
pub use strtab::*;

use thiserror::Error;

/// Object file format errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FileFormatError {
    #[error("file truncated: {needed} bytes at offset 0x{offset:x} exceed file size 0x{len:x}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("invalid ELF magic number")]
    BadMagic,
    #[error("not a 32-bit ELF file (class {0})")]
    Not32Bit(u8),
    #[error("only big-endian ELF supported (data encoding {0})")]
    NotBigEndian(u8),
    #[error("not a MIPS object (machine {0})")]
    UnsupportedMachine(u16),
    #[error("unexpected section header size {0}")]
    BadSectionEntrySize(u16),
    #[error("section name table index {index} out of range ({count} sections)")]
    BadStringTableIndex { index: u16, count: u16 },
    #[error("{what} size 0x{size:x} is not a multiple of {entry}")]
    BadTableSize {
        what: &'static str,
        size: u32,
        entry: usize,
    },
    #[error("string offset 0x{offset:x} outside string table of size 0x{size:x}")]
    BadStringOffset { offset: u32, size: usize },
    #[error("string at offset 0x{offset:x} is not valid UTF-8")]
    InvalidString { offset: u32 },
    #[error("more than one {class} section ('{name}'); relocation offsets would be ambiguous")]
    DuplicateClassSection { class: SectionClass, name: String },
}

pub type Result<T> = std::result::Result<T, FileFormatError>;
