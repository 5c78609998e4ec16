//! Parsed relocatable object.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::class::{PerClass, SectionClass};
use crate::constants::*;
use crate::header::*;
use crate::read::*;
use crate::strtab::StringTable;
use crate::{FileFormatError, Result};

/// Everything the overlay relocation builder needs from one object file.
#[derive(Clone, Debug)]
pub struct ObjectFile {
    pub header: FileHeader,
    pub sections: Vec<SectionHeader>,
    /// Section name string table (`.shstrtab`).
    pub section_names: StringTable,
    /// Contents of `.symtab`, empty if the file has none.
    pub symbols: Vec<Symbol>,
    /// Contents of `.strtab`, empty if the file has none.
    pub strtab: StringTable,
    /// Entries of `.rel.text`, `.rel.data` and `.rel.rodata`. `Other` collects
    /// relocations of allocated sections that fit none of those classes.
    pub relocs: PerClass<Vec<Relocation>>,
    /// Total `SHT_PROGBITS` size per class.
    pub progbits_sizes: PerClass<u32>,
    /// Indices of every `SHT_PROGBITS` section.
    pub progbits_sections: FxHashSet<u16>,
}

impl ObjectFile {
    /// Parse an object file from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = read_file_header(data)?;
        let sections = read_section_table(data, header.shoff, header.shnum)?;
        let section_names = Self::read_section_names(data, &header, &sections)?;

        let mut file = Self {
            header,
            sections,
            section_names,
            symbols: Vec::new(),
            strtab: StringTable::default(),
            relocs: PerClass::default(),
            progbits_sizes: PerClass::default(),
            progbits_sections: FxHashSet::default(),
        };
        file.classify_and_collect(data)?;
        Ok(file)
    }

    fn read_section_names(
        data: &[u8],
        header: &FileHeader,
        sections: &[SectionHeader],
    ) -> Result<StringTable> {
        if sections.is_empty() {
            return Ok(StringTable::default());
        }
        let shstrtab = sections
            .get(header.shstrndx as usize)
            .ok_or(FileFormatError::BadStringTableIndex {
                index: header.shstrndx,
                count: header.shnum,
            })?;
        read_string_table(data, shstrtab.offset, shstrtab.size)
    }

    /// Single pass over the section table filling in sizes, tables and
    /// relocation lists.
    fn classify_and_collect(&mut self, data: &[u8]) -> Result<()> {
        let mut has_progbits = PerClass::<bool>::default();
        let mut has_rel = PerClass::<bool>::default();

        for (index, section) in self.sections.iter().enumerate() {
            let name = self.section_names.get(section.name)?;

            match section.kind {
                SectionKind::ProgBits => {
                    self.progbits_sections.insert(index as u16);
                    let class = SectionClass::from_section_name(name);
                    if class == SectionClass::Other && !section.is_alloc() {
                        continue;
                    }
                    if class != SectionClass::Other && section.size != 0 {
                        if has_progbits[class] {
                            return Err(FileFormatError::DuplicateClassSection {
                                class,
                                name: name.to_string(),
                            });
                        }
                        has_progbits[class] = true;
                    }
                    self.progbits_sizes[class] =
                        self.progbits_sizes[class].saturating_add(section.size);
                    debug!(section = name, %class, size = section.size, "program section");
                }
                SectionKind::SymTab if name == SYMTAB_NAME => {
                    self.symbols = read_symbol_table(data, section.offset, section.size)?;
                    debug!(count = self.symbols.len(), "symbol table");
                }
                SectionKind::StrTab if name == STRTAB_NAME => {
                    self.strtab = read_string_table(data, section.offset, section.size)?;
                }
                SectionKind::Rel => {
                    let Some(class) = self.rel_class(name, section) else {
                        debug!(section = name, "ignoring relocations of unallocated section");
                        continue;
                    };
                    if class != SectionClass::Other {
                        if has_rel[class] {
                            return Err(FileFormatError::DuplicateClassSection {
                                class,
                                name: name.to_string(),
                            });
                        }
                        has_rel[class] = true;
                    }
                    let entries = read_reloc_table(data, section.offset, section.size)?;
                    debug!(section = name, %class, count = entries.len(), "relocation section");
                    self.relocs[class].extend(entries);
                }
                SectionKind::Null
                | SectionKind::SymTab
                | SectionKind::StrTab
                | SectionKind::Other(_) => {}
            }
        }

        Ok(())
    }

    /// Class of the section a `SHT_REL` section applies to.
    ///
    /// `.rel.text`, `.rel.data` and `.rel.rodata` map by name. Relocations of
    /// any other allocated program section fall into `Other`; relocations of
    /// unallocated sections (debug info and the like) are not wanted.
    fn rel_class(&self, name: &str, section: &SectionHeader) -> Option<SectionClass> {
        let target_name = name.strip_prefix(REL_PREFIX).unwrap_or(name);
        if target_name.starts_with('.') {
            let class = SectionClass::from_section_name(target_name);
            if class != SectionClass::Other {
                return Some(class);
            }
        }

        let target = self.sections.get(section.info as usize)?;
        (target.kind == SectionKind::ProgBits && target.is_alloc()).then_some(SectionClass::Other)
    }

    /// Name of the section at `index`.
    pub fn section_name(&self, index: usize) -> Result<&str> {
        let name = self.sections.get(index).map_or(0, |s| s.name);
        self.section_names.get(name)
    }

    /// Name of a symbol of this file.
    pub fn symbol_name(&self, symbol: &Symbol) -> Result<&str> {
        self.strtab.get(symbol.name)
    }

    /// Whether this file defines `symbol`: its section index is set and
    /// refers to one of the file's program sections.
    #[must_use]
    pub fn defines(&self, symbol: &Symbol) -> bool {
        symbol.shndx != SHN_UNDEF && self.progbits_sections.contains(&symbol.shndx)
    }

    /// Symbols defined by this file.
    pub fn defined_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| self.defines(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ObjectBuilder, SectionSpec, SymbolSpec};

    fn sample() -> Vec<u8> {
        ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x40]) // 1
            .section(".data", SHT_PROGBITS, vec![0; 0x10]) // 2
            .section(".rodata", SHT_PROGBITS, vec![0; 0x20]) // 3
            .section_spec(SectionSpec::new(".bss", SHT_NOBITS).flags(SHF_ALLOC).size(0x30)) // 4
            .rel(".text", &[(0x0, 1, 5), (0x4, 1, 6), (0x10, 2, 4)]) // 5
            .rel(".data", &[(0x8, 1, 2)]) // 6
            .symbol(SymbolSpec::local("local_data", 2))
            .symbol(SymbolSpec::global("func", 1).value(0x20))
            .symbol(SymbolSpec::global("counter", 4))
            .symbol(SymbolSpec::undefined("external"))
            .build()
    }

    #[test]
    fn test_parse_sizes_and_relocs() {
        let file = ObjectFile::parse(&sample()).unwrap();

        assert_eq!(file.progbits_sizes[SectionClass::Text], 0x40);
        assert_eq!(file.progbits_sizes[SectionClass::Data], 0x10);
        assert_eq!(file.progbits_sizes[SectionClass::Rodata], 0x20);
        assert_eq!(file.progbits_sizes[SectionClass::Other], 0);

        assert_eq!(file.relocs[SectionClass::Text].len(), 3);
        assert_eq!(file.relocs[SectionClass::Data].len(), 1);
        assert!(file.relocs[SectionClass::Rodata].is_empty());
        assert_eq!(file.relocs[SectionClass::Text][2].offset, 0x10);
        assert_eq!(file.relocs[SectionClass::Text][2].reloc_type(), 4);

        let mut progbits: Vec<_> = file.progbits_sections.iter().copied().collect();
        progbits.sort_unstable();
        assert_eq!(progbits, vec![1, 2, 3]);
    }

    #[test]
    fn test_defined_symbols() {
        let file = ObjectFile::parse(&sample()).unwrap();
        let names: Vec<_> = file
            .defined_symbols()
            .map(|s| file.symbol_name(s).unwrap())
            .collect();

        // bss symbols do not live in a program section
        assert_eq!(names, vec!["local_data", "func"]);
        assert!(!file.defines(&file.symbols[0]));
        assert!(!file.defines(&file.symbols[4]));
    }

    #[test]
    fn test_section_names() {
        let file = ObjectFile::parse(&sample()).unwrap();
        assert_eq!(file.section_name(0).unwrap(), "");
        assert_eq!(file.section_name(1).unwrap(), ".text");
        assert_eq!(file.section_name(5).unwrap(), ".rel.text");
        assert_eq!(file.section_name(7).unwrap(), ".symtab");
    }

    #[test]
    fn test_missing_reloc_sections_tolerated() {
        let data = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 8])
            .build();
        let file = ObjectFile::parse(&data).unwrap();
        for class in SectionClass::ALL {
            assert!(file.relocs[class].is_empty());
        }
        // only the null symbol
        assert_eq!(file.symbols.len(), 1);
    }

    #[test]
    fn test_debug_relocations_ignored() {
        let data = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 8])
            .section_spec(SectionSpec::new(".debug_info", SHT_PROGBITS).data(vec![0; 8]))
            .rel(".debug_info", &[(0, 1, 2)])
            .symbol(SymbolSpec::global("f", 1))
            .build();
        let file = ObjectFile::parse(&data).unwrap();
        for class in SectionClass::ALL {
            assert!(file.relocs[class].is_empty());
        }
        assert_eq!(file.progbits_sizes[SectionClass::Other], 0);
    }

    #[test]
    fn test_unclassified_allocated_relocations() {
        let data = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 8])
            .section(".sdata", SHT_PROGBITS, vec![0; 4])
            .rel(".sdata", &[(0, 1, 2)])
            .symbol(SymbolSpec::global("f", 1))
            .build();
        let file = ObjectFile::parse(&data).unwrap();
        assert_eq!(file.relocs[SectionClass::Other].len(), 1);
        assert_eq!(file.progbits_sizes[SectionClass::Other], 4);
    }

    #[test]
    fn test_duplicate_rel_section_rejected() {
        let data = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 8])
            .rel(".text", &[(0, 1, 4)])
            .rel(".text", &[(4, 1, 4)])
            .symbol(SymbolSpec::global("f", 1))
            .build();
        assert_eq!(
            ObjectFile::parse(&data).unwrap_err(),
            FileFormatError::DuplicateClassSection {
                class: SectionClass::Text,
                name: ".rel.text".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_progbits_rejected_unless_empty() {
        let data = ObjectBuilder::new()
            .section(".rodata", SHT_PROGBITS, vec![0; 8])
            .section(".rodata.str1.4", SHT_PROGBITS, vec![0; 8])
            .build();
        assert!(matches!(
            ObjectFile::parse(&data),
            Err(FileFormatError::DuplicateClassSection {
                class: SectionClass::Rodata,
                ..
            })
        ));

        let data = ObjectBuilder::new()
            .section(".rodata", SHT_PROGBITS, vec![0; 8])
            .section(".rodata.cst4", SHT_PROGBITS, Vec::new())
            .build();
        let file = ObjectFile::parse(&data).unwrap();
        assert_eq!(file.progbits_sizes[SectionClass::Rodata], 8);
    }

    #[test]
    fn test_bad_shstrndx() {
        let mut data = ObjectBuilder::new().build();
        data[50] = 0;
        data[51] = 40;
        assert!(matches!(
            ObjectFile::parse(&data),
            Err(FileFormatError::BadStringTableIndex { index: 40, count: 4 })
        ));
    }
}
