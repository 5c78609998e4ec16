//! Synthesized big-endian MIPS relocatable objects for tests.
//!
//! Section indices follow insertion order: index 0 is the null section, the
//! sections added through the builder come next, and `.symtab`, `.strtab`
//! and `.shstrtab` are appended last. Symbol index 0 is the null symbol.

use crate::constants::*;

/// A section to place in the synthesized object.
#[derive(Clone, Debug)]
pub struct SectionSpec {
    name: String,
    sh_type: u32,
    flags: u32,
    data: Vec<u8>,
    size: Option<u32>,
    entsize: u32,
    info_target: Option<String>,
}

impl SectionSpec {
    pub fn new(name: &str, sh_type: u32) -> Self {
        Self {
            name: name.to_string(),
            sh_type,
            flags: 0,
            data: Vec::new(),
            size: None,
            entsize: 0,
            info_target: None,
        }
    }

    #[must_use]
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Size recorded in the header without file data (for `SHT_NOBITS`).
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Point `sh_info` at the section with this name.
    #[must_use]
    pub fn info_target(mut self, name: &str) -> Self {
        self.info_target = Some(name.to_string());
        self
    }
}

/// A symbol to place in `.symtab`.
#[derive(Clone, Debug)]
pub struct SymbolSpec {
    name: String,
    value: u32,
    size: u32,
    info: u8,
    other: u8,
    shndx: u16,
}

impl SymbolSpec {
    /// Global symbol defined in section `shndx`.
    pub fn global(name: &str, shndx: u16) -> Self {
        Self {
            name: name.to_string(),
            value: 0,
            size: 0,
            info: (STB_GLOBAL << 4) | STT_NOTYPE,
            other: STV_DEFAULT,
            shndx,
        }
    }

    /// Local symbol defined in section `shndx`.
    pub fn local(name: &str, shndx: u16) -> Self {
        Self {
            info: (STB_LOCAL << 4) | STT_NOTYPE,
            ..Self::global(name, shndx)
        }
    }

    /// Undefined global reference.
    pub fn undefined(name: &str) -> Self {
        Self::global(name, SHN_UNDEF)
    }

    #[must_use]
    pub fn value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn sym_type(mut self, sym_type: u8) -> Self {
        self.info = (self.info & 0xF0) | (sym_type & 0xF);
        self
    }
}

/// Builder for a big-endian ELF32 MIPS relocatable object.
#[derive(Clone, Debug)]
pub struct ObjectBuilder {
    sections: Vec<SectionSpec>,
    symbols: Vec<SymbolSpec>,
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectBuilder {
    pub const fn new() -> Self {
        Self {
            sections: Vec::new(),
            symbols: Vec::new(),
        }
    }

    /// Add a section with flags chosen from its type and name.
    #[must_use]
    pub fn section(self, name: &str, sh_type: u32, data: Vec<u8>) -> Self {
        let flags = if sh_type == SHT_PROGBITS {
            match SectionClassHint::of(name) {
                SectionClassHint::Code => SHF_ALLOC | SHF_EXECINSTR,
                SectionClassHint::Writable => SHF_ALLOC | SHF_WRITE,
                SectionClassHint::ReadOnly => SHF_ALLOC,
            }
        } else {
            0
        };
        self.section_spec(SectionSpec::new(name, sh_type).data(data).flags(flags))
    }

    #[must_use]
    pub fn section_spec(mut self, spec: SectionSpec) -> Self {
        self.sections.push(spec);
        self
    }

    /// Add `.rel<target>` holding `(offset, symbol index, type)` entries.
    #[must_use]
    pub fn rel(self, target: &str, entries: &[(u32, u32, u8)]) -> Self {
        let data = entries
            .iter()
            .flat_map(|&(offset, sym, ty)| {
                let info = (sym << 8) | u32::from(ty);
                offset.to_be_bytes().into_iter().chain(info.to_be_bytes())
            })
            .collect();
        let mut spec = SectionSpec::new(&format!("{REL_PREFIX}{target}"), SHT_REL)
            .data(data)
            .info_target(target);
        spec.entsize = REL_SIZE as u32;
        self.section_spec(spec)
    }

    #[must_use]
    pub fn symbol(mut self, symbol: SymbolSpec) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Serialize the object.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let user_count = self.sections.len();
        let symtab_index = user_count + 1;
        let strtab_index = user_count + 2;
        let shstrtab_index = user_count + 3;
        let shnum = user_count + 4;

        // .strtab
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; SYMBOL_SIZE];
        for sym in &self.symbols {
            let name = strtab.len() as u32;
            strtab.extend_from_slice(sym.name.as_bytes());
            strtab.push(0);
            symtab.extend_from_slice(&name.to_be_bytes());
            symtab.extend_from_slice(&sym.value.to_be_bytes());
            symtab.extend_from_slice(&sym.size.to_be_bytes());
            symtab.push(sym.info);
            symtab.push(sym.other);
            symtab.extend_from_slice(&sym.shndx.to_be_bytes());
        }

        // .shstrtab
        let mut shstrtab = vec![0u8];
        let name_offset = |name: &str, table: &mut Vec<u8>| {
            let offset = table.len() as u32;
            table.extend_from_slice(name.as_bytes());
            table.push(0);
            offset
        };
        let mut names: Vec<u32> = self
            .sections
            .iter()
            .map(|s| name_offset(&s.name, &mut shstrtab))
            .collect();
        names.push(name_offset(SYMTAB_NAME, &mut shstrtab));
        names.push(name_offset(STRTAB_NAME, &mut shstrtab));
        names.push(name_offset(".shstrtab", &mut shstrtab));

        let mut out = vec![0u8; FILE_HEADER_SIZE];
        let mut headers: Vec<[u32; 10]> = vec![[0; 10]];

        let place = |out: &mut Vec<u8>, bytes: &[u8]| {
            while out.len() % 4 != 0 {
                out.push(0);
            }
            let offset = out.len() as u32;
            out.extend_from_slice(bytes);
            offset
        };

        for (i, spec) in self.sections.iter().enumerate() {
            let offset = place(&mut out, &spec.data);
            let size = spec.size.unwrap_or(spec.data.len() as u32);
            let info = spec
                .info_target
                .as_ref()
                .and_then(|t| self.sections.iter().position(|s| &s.name == t))
                .map_or(0, |p| p as u32 + 1);
            let link = if spec.sh_type == SHT_REL {
                symtab_index as u32
            } else {
                0
            };
            headers.push([
                names[i],
                spec.sh_type,
                spec.flags,
                0,
                offset,
                size,
                link,
                info,
                4,
                spec.entsize,
            ]);
        }

        let first_global = self
            .symbols
            .iter()
            .position(|s| s.info >> 4 != STB_LOCAL)
            .unwrap_or(self.symbols.len())
            + 1;
        let offset = place(&mut out, &symtab);
        headers.push([
            names[user_count],
            SHT_SYMTAB,
            0,
            0,
            offset,
            symtab.len() as u32,
            strtab_index as u32,
            first_global as u32,
            4,
            SYMBOL_SIZE as u32,
        ]);
        let offset = place(&mut out, &strtab);
        headers.push([
            names[user_count + 1],
            SHT_STRTAB,
            0,
            0,
            offset,
            strtab.len() as u32,
            0,
            0,
            1,
            0,
        ]);
        let offset = place(&mut out, &shstrtab);
        headers.push([
            names[user_count + 2],
            SHT_STRTAB,
            0,
            0,
            offset,
            shstrtab.len() as u32,
            0,
            0,
            1,
            0,
        ]);

        let shoff = place(&mut out, &[]);
        for header in &headers {
            for word in header {
                out.extend_from_slice(&word.to_be_bytes());
            }
        }

        out[..4].copy_from_slice(&ELF_MAGIC);
        out[EI_CLASS] = ELF_CLASS_32;
        out[EI_DATA] = ELF_DATA_MSB;
        out[EI_VERSION] = ELF_VERSION_CURRENT;
        out[16..18].copy_from_slice(&ELF_TYPE_REL.to_be_bytes());
        out[18..20].copy_from_slice(&ELF_MACHINE_MIPS.to_be_bytes());
        out[20..24].copy_from_slice(&u32::from(ELF_VERSION_CURRENT).to_be_bytes());
        out[32..36].copy_from_slice(&shoff.to_be_bytes());
        out[40..42].copy_from_slice(&(FILE_HEADER_SIZE as u16).to_be_bytes());
        out[46..48].copy_from_slice(&(SECTION_HEADER_SIZE as u16).to_be_bytes());
        out[48..50].copy_from_slice(&(shnum as u16).to_be_bytes());
        out[50..52].copy_from_slice(&(shstrtab_index as u16).to_be_bytes());
        out
    }
}

enum SectionClassHint {
    Code,
    Writable,
    ReadOnly,
}

impl SectionClassHint {
    fn of(name: &str) -> Self {
        if name.starts_with(".text") {
            Self::Code
        } else if name.starts_with(".rodata") {
            Self::ReadOnly
        } else {
            Self::Writable
        }
    }
}
