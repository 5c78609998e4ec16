//! NUL-terminated string tables.

use crate::{FileFormatError, Result};

/// Owned copy of a string table section (`.strtab` or `.shstrtab`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    data: Vec<u8>,
}

impl StringTable {
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// String starting at `offset`, up to the next NUL or the end of the table.
    pub fn get(&self, offset: u32) -> Result<&str> {
        let start = offset as usize;
        let tail = self
            .data
            .get(start..)
            .filter(|_| start < self.data.len() || start == 0)
            .ok_or(FileFormatError::BadStringOffset {
                offset,
                size: self.data.len(),
            })?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        std::str::from_utf8(&tail[..end]).map_err(|_| FileFormatError::InvalidString { offset })
    }
}
