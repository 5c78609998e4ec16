//! ELF specification constants.

// ELF header constants
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
pub const ELF_CLASS_32: u8 = 1;
pub const ELF_CLASS_64: u8 = 2;
pub const ELF_DATA_LSB: u8 = 1;
pub const ELF_DATA_MSB: u8 = 2;
pub const ELF_VERSION_CURRENT: u8 = 1;
pub const ELF_TYPE_REL: u16 = 1;
pub const ELF_MACHINE_MIPS: u16 = 8;

// Identification byte offsets
pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EI_OSABI: usize = 7;

// Structure sizes (ELF32)
pub const FILE_HEADER_SIZE: usize = 52;
pub const SECTION_HEADER_SIZE: usize = 40;
pub const SYMBOL_SIZE: usize = 16;
pub const REL_SIZE: usize = 8;

// Section header constants
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_HASH: u32 = 5;
pub const SHT_DYNAMIC: u32 = 6;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
pub const SHT_SHLIB: u32 = 10;
pub const SHT_DYNSYM: u32 = 11;
pub const SHT_INIT_ARRAY: u32 = 14;
pub const SHT_FINI_ARRAY: u32 = 15;
pub const SHT_PREINIT_ARRAY: u32 = 16;
pub const SHT_GROUP: u32 = 17;
pub const SHT_SYMTAB_SHNDX: u32 = 18;
pub const SHT_MIPS_DEBUG: u32 = 0x7000_0005;
pub const SHT_MIPS_REGINFO: u32 = 0x7000_0006;
pub const SHT_MIPS_OPTIONS: u32 = 0x7000_000D;
pub const SHT_MIPS_DWARF: u32 = 0x7000_001E;
pub const SHT_MIPS_ABIFLAGS: u32 = 0x7000_002A;

// Section flags, in the order readelf prints their letters
pub const SHF_WRITE: u32 = 0x1;
pub const SHF_ALLOC: u32 = 0x2;
pub const SHF_EXECINSTR: u32 = 0x4;
pub const SHF_MERGE: u32 = 0x10;
pub const SHF_STRINGS: u32 = 0x20;
pub const SHF_INFO_LINK: u32 = 0x40;
pub const SHF_LINK_ORDER: u32 = 0x80;
pub const SHF_OS_NONCONFORMING: u32 = 0x100;
pub const SHF_GROUP: u32 = 0x200;
pub const SHF_TLS: u32 = 0x400;
pub const SHF_FLAG_LETTERS: [(u32, char); 10] = [
    (SHF_WRITE, 'W'),
    (SHF_ALLOC, 'A'),
    (SHF_EXECINSTR, 'X'),
    (SHF_MERGE, 'M'),
    (SHF_STRINGS, 'S'),
    (SHF_INFO_LINK, 'I'),
    (SHF_LINK_ORDER, 'L'),
    (SHF_OS_NONCONFORMING, 'O'),
    (SHF_GROUP, 'G'),
    (SHF_TLS, 'T'),
];

// Special section indices
pub const SHN_UNDEF: u16 = 0;
pub const SHN_ABS: u16 = 0xFFF1;
pub const SHN_COMMON: u16 = 0xFFF2;

// Symbol binding (upper 4 bits of st_info)
pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;

// Symbol type (lower 4 bits of st_info)
pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;
pub const STT_FILE: u8 = 4;

// Symbol visibility (lower 2 bits of st_other)
pub const STV_DEFAULT: u8 = 0;
pub const STV_INTERNAL: u8 = 1;
pub const STV_HIDDEN: u8 = 2;
pub const STV_PROTECTED: u8 = 3;

// Well-known section names
pub const SYMTAB_NAME: &str = ".symtab";
pub const STRTAB_NAME: &str = ".strtab";
pub const REL_PREFIX: &str = ".rel";
