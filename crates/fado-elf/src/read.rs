//! Table readers.
//!
//! Each reader takes the whole file plus the location of the structure it
//! reads, as recorded in the file or section header. Every access is checked
//! against the buffer, and multi-byte fields are converted from big-endian.

use crate::constants::*;
use crate::header::*;
use crate::strtab::StringTable;
use crate::{FileFormatError, Result};

/// Bounds-checked view of `size` bytes at `offset`.
fn view(data: &[u8], offset: usize, size: usize) -> Result<&[u8]> {
    offset
        .checked_add(size)
        .and_then(|end| data.get(offset..end))
        .ok_or(FileFormatError::Truncated {
            offset,
            needed: size,
            len: data.len(),
        })
}

/// Read big-endian u16 from bytes.
#[inline]
fn read_be16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

/// Read big-endian u32 from bytes.
#[inline]
fn read_be32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Check that a table is a whole number of entries.
fn check_table_size(what: &'static str, size: u32, entry: usize) -> Result<()> {
    if size as usize % entry != 0 {
        return Err(FileFormatError::BadTableSize { what, size, entry });
    }
    Ok(())
}

/// Read and verify the ELF32 file header.
pub fn read_file_header(data: &[u8]) -> Result<FileHeader> {
    if data.len() < EI_CLASS {
        return Err(FileFormatError::Truncated {
            offset: 0,
            needed: FILE_HEADER_SIZE,
            len: data.len(),
        });
    }
    if data[..4] != ELF_MAGIC {
        return Err(FileFormatError::BadMagic);
    }

    let raw = view(data, 0, FILE_HEADER_SIZE)?;
    let class = raw[EI_CLASS];
    if class != ELF_CLASS_32 {
        return Err(FileFormatError::Not32Bit(class));
    }
    let encoding = raw[EI_DATA];
    if encoding != ELF_DATA_MSB {
        return Err(FileFormatError::NotBigEndian(encoding));
    }

    let header = FileHeader {
        class,
        data: encoding,
        version: raw[EI_VERSION],
        abi: raw[EI_OSABI],
        e_type: read_be16(raw, 16),
        machine: read_be16(raw, 18),
        e_version: read_be32(raw, 20),
        entry: read_be32(raw, 24),
        phoff: read_be32(raw, 28),
        shoff: read_be32(raw, 32),
        flags: read_be32(raw, 36),
        ehsize: read_be16(raw, 40),
        phentsize: read_be16(raw, 42),
        phnum: read_be16(raw, 44),
        shentsize: read_be16(raw, 46),
        shnum: read_be16(raw, 48),
        shstrndx: read_be16(raw, 50),
    };

    if header.machine != ELF_MACHINE_MIPS {
        return Err(FileFormatError::UnsupportedMachine(header.machine));
    }
    if header.shnum != 0 && header.shentsize as usize != SECTION_HEADER_SIZE {
        return Err(FileFormatError::BadSectionEntrySize(header.shentsize));
    }

    Ok(header)
}

/// Read `count` section headers starting at `offset`.
///
/// Every field of an ELF32 section header is a word, so the table is decoded
/// as a flat big-endian word array and regrouped ten words per header.
pub fn read_section_table(data: &[u8], offset: u32, count: u16) -> Result<Vec<SectionHeader>> {
    let table = view(data, offset as usize, count as usize * SECTION_HEADER_SIZE)?;
    let words: Vec<u32> = table
        .chunks_exact(4)
        .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
        .collect();

    Ok(words
        .chunks_exact(SECTION_HEADER_SIZE / 4)
        .map(|w| {
            SectionHeader::from_words([w[0], w[1], w[2], w[3], w[4], w[5], w[6], w[7], w[8], w[9]])
        })
        .collect())
}

/// Read a symbol table of `size` bytes at `offset`.
pub fn read_symbol_table(data: &[u8], offset: u32, size: u32) -> Result<Vec<Symbol>> {
    check_table_size("symbol table", size, SYMBOL_SIZE)?;
    let table = view(data, offset as usize, size as usize)?;

    Ok(table
        .chunks_exact(SYMBOL_SIZE)
        .map(|entry| Symbol {
            name: read_be32(entry, 0),
            value: read_be32(entry, 4),
            size: read_be32(entry, 8),
            info: entry[12],
            other: entry[13],
            shndx: read_be16(entry, 14),
        })
        .collect())
}

/// Read a string table of `size` bytes at `offset`.
pub fn read_string_table(data: &[u8], offset: u32, size: u32) -> Result<StringTable> {
    let table = view(data, offset as usize, size as usize)?;
    Ok(StringTable::new(table.to_vec()))
}

/// Read a `SHT_REL` table of `size` bytes at `offset`.
pub fn read_reloc_table(data: &[u8], offset: u32, size: u32) -> Result<Vec<Relocation>> {
    check_table_size("relocation table", size, REL_SIZE)?;
    let table = view(data, offset as usize, size as usize)?;

    Ok(table
        .chunks_exact(REL_SIZE)
        .map(|entry| Relocation {
            offset: read_be32(entry, 0),
            info: read_be32(entry, 4),
        })
        .collect())
}
