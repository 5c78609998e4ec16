//! ELF32 header structures.

use crate::constants::*;

/// ELF32 file header with every multi-byte field in host order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHeader {
    pub class: u8,
    pub data: u8,
    pub version: u8,
    pub abi: u8,
    pub e_type: u16,
    pub machine: u16,
    pub e_version: u32,
    pub entry: u32,
    pub phoff: u32,
    pub shoff: u32,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

/// Section type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    Null,
    ProgBits,
    SymTab,
    StrTab,
    Rel,
    Other(u32),
}

impl SectionKind {
    #[must_use]
    pub const fn from_raw(sh_type: u32) -> Self {
        match sh_type {
            SHT_NULL => Self::Null,
            SHT_PROGBITS => Self::ProgBits,
            SHT_SYMTAB => Self::SymTab,
            SHT_STRTAB => Self::StrTab,
            SHT_REL => Self::Rel,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Null => SHT_NULL,
            Self::ProgBits => SHT_PROGBITS,
            Self::SymTab => SHT_SYMTAB,
            Self::StrTab => SHT_STRTAB,
            Self::Rel => SHT_REL,
            Self::Other(raw) => raw,
        }
    }

    /// readelf-style type name, `None` for types this reader has no name for.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::Null => "NULL",
            Self::ProgBits => "PROGBITS",
            Self::SymTab => "SYMTAB",
            Self::StrTab => "STRTAB",
            Self::Rel => "REL",
            Self::Other(raw) => match raw {
                SHT_RELA => "RELA",
                SHT_HASH => "HASH",
                SHT_DYNAMIC => "DYNAMIC",
                SHT_NOTE => "NOTE",
                SHT_NOBITS => "NOBITS",
                SHT_SHLIB => "SHLIB",
                SHT_DYNSYM => "DYNSYM",
                SHT_INIT_ARRAY => "INIT_ARRAY",
                SHT_FINI_ARRAY => "FINI_ARRAY",
                SHT_PREINIT_ARRAY => "PREINIT_ARRAY",
                SHT_GROUP => "GROUP",
                SHT_SYMTAB_SHNDX => "SYMTAB_SHNDX",
                SHT_MIPS_DEBUG => "MIPS_DEBUG",
                SHT_MIPS_REGINFO => "MIPS_REGINFO",
                SHT_MIPS_OPTIONS => "MIPS_OPTIONS",
                SHT_MIPS_DWARF => "MIPS_DWARF",
                SHT_MIPS_ABIFLAGS => "MIPS_ABIFLAGS",
                _ => return None,
            },
        };
        Some(name)
    }
}

/// ELF32 section header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: u32,
    pub kind: SectionKind,
    pub flags: u32,
    pub addr: u32,
    pub offset: u32,
    pub size: u32,
    pub link: u32,
    pub info: u32,
    pub addralign: u32,
    pub entsize: u32,
}

impl SectionHeader {
    /// Build a header from its ten words, in file order.
    #[must_use]
    pub const fn from_words(words: [u32; 10]) -> Self {
        Self {
            name: words[0],
            kind: SectionKind::from_raw(words[1]),
            flags: words[2],
            addr: words[3],
            offset: words[4],
            size: words[5],
            link: words[6],
            info: words[7],
            addralign: words[8],
            entsize: words[9],
        }
    }

    #[must_use]
    pub const fn is_alloc(&self) -> bool {
        (self.flags & SHF_ALLOC) != 0
    }
}

/// ELF32 symbol table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    /// Offset of the name in the string table.
    pub name: u32,
    pub value: u32,
    pub size: u32,
    /// Type (low nibble) and binding (high nibble).
    pub info: u8,
    /// Visibility (low two bits).
    pub other: u8,
    /// Index of the defining section.
    pub shndx: u16,
}

impl Symbol {
    #[must_use]
    pub const fn sym_type(&self) -> u8 {
        self.info & 0xF
    }

    #[must_use]
    pub const fn binding(&self) -> u8 {
        self.info >> 4
    }

    #[must_use]
    pub const fn visibility(&self) -> u8 {
        self.other & 0x3
    }

    #[must_use]
    pub const fn is_undef(&self) -> bool {
        self.shndx == SHN_UNDEF
    }
}

/// ELF32 `SHT_REL` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// Byte offset within the relocated section.
    pub offset: u32,
    /// Symbol index (upper 24 bits) and relocation type (low byte).
    pub info: u32,
}

impl Relocation {
    #[must_use]
    pub const fn symbol(&self) -> u32 {
        self.info >> 8
    }

    #[must_use]
    pub const fn reloc_type(&self) -> u8 {
        (self.info & 0xFF) as u8
    }
}

/// readelf-style name for a symbol type.
#[must_use]
pub const fn symbol_type_name(sym_type: u8) -> &'static str {
    match sym_type {
        STT_NOTYPE => "NOTYPE",
        STT_OBJECT => "OBJECT",
        STT_FUNC => "FUNC",
        STT_SECTION => "SECTION",
        STT_FILE => "FILE",
        5 => "COMMON",
        6 => "TLS",
        _ => "<unknown>",
    }
}

/// readelf-style name for a symbol binding.
#[must_use]
pub const fn symbol_binding_name(binding: u8) -> &'static str {
    match binding {
        STB_LOCAL => "LOCAL",
        STB_GLOBAL => "GLOBAL",
        STB_WEAK => "WEAK",
        _ => "<unknown>",
    }
}

/// readelf-style name for a symbol visibility.
#[must_use]
pub const fn symbol_visibility_name(visibility: u8) -> &'static str {
    match visibility {
        STV_DEFAULT => "DEFAULT",
        STV_INTERNAL => "INTERNAL",
        STV_HIDDEN => "HIDDEN",
        STV_PROTECTED => "PROTECTED",
        _ => "<unknown>",
    }
}
