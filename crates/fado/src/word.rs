//! Packed relocation words.
//!
//! ```text
//!  31 30 29        24 23                      0
//! +-----+------------+-------------------------+
//! |class|    type    |     overlay offset      |
//! +-----+------------+-------------------------+
//! ```

use std::fmt;

use fado_elf::{RelocType, SectionClass};

/// One entry of the overlay relocation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RelocWord(u32);

impl RelocWord {
    pub const CLASS_SHIFT: u32 = 30;
    pub const TYPE_SHIFT: u32 = 24;
    pub const TYPE_MASK: u32 = 0x3F;
    pub const OFFSET_MASK: u32 = 0x00FF_FFFF;

    /// Pack a relocation, or `None` if `offset` does not fit in 24 bits.
    #[must_use]
    pub fn pack(class: SectionClass, reloc_type: RelocType, offset: u64) -> Option<Self> {
        let offset = u32::try_from(offset).ok().filter(|&o| o <= Self::OFFSET_MASK)?;
        Some(Self(
            (class.tag() << Self::CLASS_SHIFT)
                | ((u32::from(reloc_type.code()) & Self::TYPE_MASK) << Self::TYPE_SHIFT)
                | offset,
        ))
    }

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn class(self) -> SectionClass {
        SectionClass::from_tag(self.0 >> Self::CLASS_SHIFT)
    }

    #[must_use]
    pub const fn type_code(self) -> u8 {
        ((self.0 >> Self::TYPE_SHIFT) & Self::TYPE_MASK) as u8
    }

    #[must_use]
    pub const fn reloc_type(self) -> Option<RelocType> {
        RelocType::from_code(self.type_code())
    }

    #[must_use]
    pub const fn offset(self) -> u32 {
        self.0 & Self::OFFSET_MASK
    }
}

impl fmt::UpperHex for RelocWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}
