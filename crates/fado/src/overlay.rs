//! Overlay relocation builder.
//!
//! Turns the relocations of every object of an overlay into packed table
//! words. Objects are taken in link order: each class's offsets accumulate
//! over the program section sizes of the files before it, exactly as the
//! static link lays the overlay out.
//!
//! A relocation whose symbol is undefined in its own file but defined by
//! another file of the overlay is left out. The static link of the overlay
//! resolves those references, and the loader only has to patch what is left.
//! If the inputs are not linked together the table will be missing those
//! entries. Only named, non-local symbols take part in this: references
//! through local or section symbols always stay in the table.

use std::path::PathBuf;

use fado_elf::{ObjectFile, PerClass, RelocType, Relocation, STB_LOCAL, SectionClass, Symbol};
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::word::RelocWord;

/// One object file of the overlay.
#[derive(Clone, Debug)]
pub struct InputFile {
    pub path: PathBuf,
    pub object: ObjectFile,
}

impl InputFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, object: ObjectFile) -> Self {
        Self {
            path: path.into(),
            object,
        }
    }
}

/// Builder configuration.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Reject relocations of sections that are not text, data or rodata
    /// instead of emitting them with class tag 0.
    pub strict: bool,
}

impl BuildOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Non-fatal findings of a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// The symbol is defined by no file of the overlay; the relocation is kept.
    UnresolvedReference {
        path: PathBuf,
        symbol: String,
        class: SectionClass,
        offset: u32,
    },
    /// The relocated section is not text, data or rodata; the relocation is
    /// kept with class tag 0.
    InvalidSectionClass {
        path: PathBuf,
        symbol: String,
        offset: u32,
    },
}

/// A relocation that made it into the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedReloc<'a> {
    /// Index of the input file the relocation came from.
    pub file: usize,
    /// Name of the referenced symbol.
    pub symbol: &'a str,
    pub word: RelocWord,
}

/// Packed relocations of a whole overlay, grouped by class.
#[derive(Clone, Debug, Default)]
pub struct OverlayRelocs<'a> {
    relocs: PerClass<Vec<PackedReloc<'a>>>,
    pub warnings: Vec<Warning>,
}

impl<'a> OverlayRelocs<'a> {
    /// Relocations of one class, in (file, intra-file) order.
    #[must_use]
    pub fn class(&self, class: SectionClass) -> &[PackedReloc<'a>] {
        &self.relocs[class]
    }

    /// Non-empty classes in table order.
    pub fn classes(&self) -> impl Iterator<Item = (SectionClass, &[PackedReloc<'a>])> {
        self.relocs
            .iter()
            .filter(|(_, relocs)| !relocs.is_empty())
            .map(|(class, relocs)| (class, relocs.as_slice()))
    }

    /// Total number of packed relocations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.relocs.iter().map(|(_, relocs)| relocs.len()).sum()
    }

    pub fn words(&self) -> impl Iterator<Item = RelocWord> + '_ {
        self.classes()
            .flat_map(|(_, relocs)| relocs.iter().map(|r| r.word))
    }
}

/// Whether the static link can bind a reference to `symbol` to another file.
/// Local and unnamed (section) symbols never cross file boundaries.
fn links_across_files(symbol: &Symbol, name: &str) -> bool {
    symbol.binding() != STB_LOCAL && !name.is_empty()
}

/// Names of the symbols one file defines for the rest of the overlay.
fn exported_names(input: &InputFile) -> Result<FxHashSet<&str>, BuildError> {
    let mut names = FxHashSet::default();
    for symbol in input.object.defined_symbols() {
        let name = input
            .object
            .symbol_name(symbol)
            .map_err(|source| BuildError::SymbolName {
                path: input.path.clone(),
                source,
            })?;
        if links_across_files(symbol, name) {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Build the relocation table of an overlay from its objects in link order.
pub fn build<'a>(
    inputs: &'a [InputFile],
    options: &BuildOptions,
) -> Result<OverlayRelocs<'a>, BuildError> {
    let packer = Packer {
        inputs,
        defined: inputs
            .iter()
            .map(exported_names)
            .collect::<Result<Vec<_>, _>>()?,
        options,
    };

    let mut out = OverlayRelocs::default();

    for class in SectionClass::ALL {
        let mut class_offset: u64 = 0;

        for (file, input) in inputs.iter().enumerate() {
            for rel in &input.object.relocs[class] {
                if let Some(reloc) =
                    packer.pack(file, class, class_offset, rel, &mut out.warnings)?
                {
                    out.relocs[class].push(reloc);
                }
            }
            class_offset += u64::from(input.object.progbits_sizes[class]);
        }

        debug!(%class, count = out.relocs[class].len(), size = class_offset, "class packed");
    }

    info!(
        files = inputs.len(),
        relocs = out.count(),
        warnings = out.warnings.len(),
        "overlay relocations built"
    );
    Ok(out)
}

struct Packer<'a, 'o> {
    inputs: &'a [InputFile],
    defined: Vec<FxHashSet<&'a str>>,
    options: &'o BuildOptions,
}

impl<'a> Packer<'a, '_> {
    fn defined_elsewhere(&self, this_file: usize, name: &str) -> bool {
        self.defined
            .iter()
            .enumerate()
            .any(|(index, names)| index != this_file && names.contains(name))
    }

    /// Pack one relocation of `file`, or `None` if the overlay link resolves it.
    fn pack(
        &self,
        file: usize,
        class: SectionClass,
        class_offset: u64,
        rel: &Relocation,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<PackedReloc<'a>>, BuildError> {
        let input = &self.inputs[file];
        let object = &input.object;
        let path = input.path.as_path();

        let symbol = object
            .symbols
            .get(rel.symbol() as usize)
            .ok_or_else(|| BuildError::SymbolOutOfRange {
                path: path.to_path_buf(),
                offset: rel.offset,
                index: rel.symbol(),
                count: object.symbols.len(),
            })?;
        let name = object
            .symbol_name(symbol)
            .map_err(|source| BuildError::SymbolName {
                path: path.to_path_buf(),
                source,
            })?;

        if !object.defines(symbol) {
            if links_across_files(symbol, name) && self.defined_elsewhere(file, name) {
                debug!(
                    file = %path.display(),
                    symbol = name,
                    offset = rel.offset,
                    "resolved by overlay link"
                );
                return Ok(None);
            }
            if symbol.is_undef() {
                info!(
                    file = %path.display(),
                    symbol = name,
                    %class,
                    offset = rel.offset,
                    "unresolved reference"
                );
                warnings.push(Warning::UnresolvedReference {
                    path: path.to_path_buf(),
                    symbol: name.to_string(),
                    class,
                    offset: rel.offset,
                });
            }
        }

        if class == SectionClass::Other {
            if self.options.strict {
                return Err(BuildError::InvalidSectionClass {
                    path: path.to_path_buf(),
                    offset: rel.offset,
                    symbol: name.to_string(),
                });
            }
            warn!(
                file = %path.display(),
                symbol = name,
                offset = rel.offset,
                "relocated section is not text, data or rodata, emitting class tag 0"
            );
            warnings.push(Warning::InvalidSectionClass {
                path: path.to_path_buf(),
                symbol: name.to_string(),
                offset: rel.offset,
            });
        }

        let code = rel.reloc_type();
        let reloc_type =
            RelocType::from_code(code).ok_or_else(|| BuildError::UnknownRelocType {
                path: path.to_path_buf(),
                offset: rel.offset,
                code,
            })?;

        let offset = u64::from(rel.offset) + class_offset;
        let word = RelocWord::pack(class, reloc_type, offset).ok_or_else(|| {
            BuildError::OffsetOverflow {
                path: path.to_path_buf(),
                class,
                offset,
            }
        })?;

        Ok(Some(PackedReloc {
            file,
            symbol: name,
            word,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fado_elf::{SHF_ALLOC, SHF_WRITE, SHT_NOBITS, SHT_PROGBITS, STT_SECTION};
    use fado_elf::testing::{ObjectBuilder, SectionSpec, SymbolSpec};

    fn input(path: &str, builder: &ObjectBuilder) -> InputFile {
        InputFile::new(path, ObjectFile::parse(&builder.build()).unwrap())
    }

    fn raw_words(relocs: &OverlayRelocs<'_>, class: SectionClass) -> Vec<u32> {
        relocs.class(class).iter().map(|r| r.word.raw()).collect()
    }

    #[test]
    fn test_offsets_accumulate_across_files() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x100])
            .rel(".text", &[(0x10, 1, 4)])
            .symbol(SymbolSpec::global("a_func", 1));
        let b = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x40])
            .rel(".text", &[(0x20, 1, 4)])
            .symbol(SymbolSpec::global("b_func", 1));
        let inputs = [input("a.o", &a), input("b.o", &b)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(raw_words(&relocs, SectionClass::Text), vec![0x4400_0010, 0x4400_0120]);
        assert_eq!(relocs.class(SectionClass::Text)[1].file, 1);
        assert_eq!(relocs.class(SectionClass::Text)[1].symbol, "b_func");
        assert!(relocs.warnings.is_empty());
    }

    #[test]
    fn test_classes_accumulate_independently() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x80])
            .section(".data", SHT_PROGBITS, vec![0; 0x10])
            .symbol(SymbolSpec::global("a", 1));
        let b = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x8])
            .section(".data", SHT_PROGBITS, vec![0; 0x8])
            .section(".rodata", SHT_PROGBITS, vec![0; 0x8])
            .rel(".data", &[(0x4, 1, 2)])
            .rel(".rodata", &[(0x0, 1, 2)])
            .symbol(SymbolSpec::global("b", 2));
        let inputs = [input("a.o", &a), input("b.o", &b)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert!(relocs.class(SectionClass::Text).is_empty());
        assert_eq!(raw_words(&relocs, SectionClass::Data), vec![0x8200_0014]);
        assert_eq!(raw_words(&relocs, SectionClass::Rodata), vec![0xC200_0000]);
        assert_eq!(relocs.count(), 2);
        let classes: Vec<_> = relocs.classes().map(|(class, _)| class).collect();
        assert_eq!(classes, vec![SectionClass::Data, SectionClass::Rodata]);
    }

    #[test]
    fn test_reference_defined_in_other_file_dropped() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x10])
            .symbol(SymbolSpec::global("foo", 1));
        let b = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x10])
            .rel(".text", &[(0x0, 1, 4), (0x8, 2, 4)])
            .symbol(SymbolSpec::undefined("foo"))
            .symbol(SymbolSpec::global("bar", 1));
        let inputs = [input("a.o", &a), input("b.o", &b)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        let text = relocs.class(SectionClass::Text);
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].symbol, "bar");
        assert_eq!(text[0].word.offset(), 0x18);
    }

    #[test]
    fn test_unresolved_reference_kept_with_warning() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x10])
            .rel(".text", &[(0x4, 1, 4)])
            .symbol(SymbolSpec::undefined("foo"));
        let inputs = [input("a.o", &a)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(raw_words(&relocs, SectionClass::Text), vec![0x4400_0004]);
        assert_eq!(
            relocs.warnings,
            vec![Warning::UnresolvedReference {
                path: PathBuf::from("a.o"),
                symbol: "foo".to_string(),
                class: SectionClass::Text,
                offset: 4,
            }]
        );
    }

    #[test]
    fn test_local_symbol_kept_even_if_name_defined_elsewhere() {
        let a = ObjectBuilder::new()
            .section(".data", SHT_PROGBITS, vec![0; 0x10])
            .symbol(SymbolSpec::local("table", 1));
        let b = ObjectBuilder::new()
            .section(".data", SHT_PROGBITS, vec![0; 0x10])
            .rel(".data", &[(0x0, 1, 2)])
            .symbol(SymbolSpec::local("table", 1));
        let inputs = [input("a.o", &a), input("b.o", &b)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(raw_words(&relocs, SectionClass::Data), vec![0x8200_0010]);
    }

    #[test]
    fn test_section_symbol_relocs_kept_across_files() {
        // a.o: .text and its section symbol
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x20])
            .symbol(SymbolSpec::local("", 1).sym_type(STT_SECTION));
        // b.o: static bss data addressed through the .bss section symbol
        let b = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x10])
            .section_spec(
                SectionSpec::new(".bss", SHT_NOBITS)
                    .flags(SHF_ALLOC | SHF_WRITE)
                    .size(0x8),
            )
            .rel(".text", &[(0x0, 1, 5), (0x4, 1, 6)])
            .symbol(SymbolSpec::local("", 2).sym_type(STT_SECTION));

        let alone = [input("b.o", &b)];
        assert_eq!(build(&alone, &BuildOptions::new()).unwrap().count(), 2);

        let inputs = [input("a.o", &a), input("b.o", &b)];
        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(raw_words(&relocs, SectionClass::Text), vec![0x4500_0020, 0x4600_0024]);
        assert!(relocs.warnings.is_empty());
    }

    #[test]
    fn test_local_definition_does_not_resolve_other_files() {
        // a.o has a file-local sBuffer, b.o refers to an external sBuffer
        let a = ObjectBuilder::new()
            .section(".data", SHT_PROGBITS, vec![0; 0x10])
            .symbol(SymbolSpec::local("sBuffer", 1));
        let b = ObjectBuilder::new()
            .section(".data", SHT_PROGBITS, vec![0; 0x10])
            .rel(".data", &[(0x4, 1, 2)])
            .symbol(SymbolSpec::undefined("sBuffer"));
        let inputs = [input("a.o", &a), input("b.o", &b)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(raw_words(&relocs, SectionClass::Data), vec![0x8200_0014]);
        assert!(matches!(
            relocs.warnings.as_slice(),
            [Warning::UnresolvedReference { offset: 4, .. }]
        ));
    }

    #[test]
    fn test_local_reference_not_resolved_by_other_files() {
        // b.o's static sCount lives in .bss; a.o exports a global of the same name
        let a = ObjectBuilder::new()
            .section(".data", SHT_PROGBITS, vec![0; 0x10])
            .symbol(SymbolSpec::global("sCount", 1));
        let b = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x10])
            .section_spec(
                SectionSpec::new(".bss", SHT_NOBITS)
                    .flags(SHF_ALLOC | SHF_WRITE)
                    .size(0x4),
            )
            .rel(".text", &[(0x8, 1, 5)])
            .symbol(SymbolSpec::local("sCount", 2));
        let inputs = [input("a.o", &a), input("b.o", &b)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(raw_words(&relocs, SectionClass::Text), vec![0x4500_0008]);
        assert!(relocs.warnings.is_empty());
    }

    #[test]
    fn test_other_class_warns_or_fails_when_strict() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x8])
            .section(".sdata", SHT_PROGBITS, vec![0; 0x8])
            .rel(".sdata", &[(0x4, 1, 2)])
            .symbol(SymbolSpec::global("f", 1));
        let inputs = [input("a.o", &a)];

        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(raw_words(&relocs, SectionClass::Other), vec![0x0200_0004]);
        assert!(matches!(
            relocs.warnings.as_slice(),
            [Warning::InvalidSectionClass { offset: 4, .. }]
        ));

        let err = build(&inputs, &BuildOptions::new().with_strict(true)).unwrap_err();
        assert!(matches!(err, BuildError::InvalidSectionClass { offset: 4, .. }));
    }

    #[test]
    fn test_symbol_out_of_range() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x8])
            .rel(".text", &[(0x0, 9, 4)]);
        let inputs = [input("a.o", &a)];

        assert_eq!(
            build(&inputs, &BuildOptions::new()).unwrap_err(),
            BuildError::SymbolOutOfRange {
                path: PathBuf::from("a.o"),
                offset: 0,
                index: 9,
                count: 1,
            }
        );
    }

    #[test]
    fn test_unknown_reloc_type() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x8])
            .rel(".text", &[(0x0, 1, 13)])
            .symbol(SymbolSpec::global("f", 1));
        let inputs = [input("a.o", &a)];

        assert!(matches!(
            build(&inputs, &BuildOptions::new()),
            Err(BuildError::UnknownRelocType { code: 13, .. })
        ));
    }

    #[test]
    fn test_offset_overflow() {
        let a = ObjectBuilder::new()
            .section_spec(
                SectionSpec::new(".text", SHT_PROGBITS)
                    .flags(fado_elf::SHF_ALLOC | fado_elf::SHF_EXECINSTR)
                    .size(0x00FF_FFF0),
            )
            .symbol(SymbolSpec::global("f", 1));
        let b = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 0x20])
            .rel(".text", &[(0x10, 1, 4)])
            .symbol(SymbolSpec::global("g", 1));
        let inputs = [input("a.o", &a), input("b.o", &b)];

        assert_eq!(
            build(&inputs, &BuildOptions::new()).unwrap_err(),
            BuildError::OffsetOverflow {
                path: PathBuf::from("b.o"),
                class: SectionClass::Text,
                offset: 0x0100_0000,
            }
        );
    }

    #[test]
    fn test_empty_overlay() {
        let a = ObjectBuilder::new()
            .section(".text", SHT_PROGBITS, vec![0; 4]);
        let inputs = [input("a.o", &a)];
        let relocs = build(&inputs, &BuildOptions::new()).unwrap();
        assert_eq!(relocs.count(), 0);
        assert_eq!(relocs.words().count(), 0);
    }
}
