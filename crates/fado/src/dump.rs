//! readelf-style listings of a single object file.

use std::fmt::Write as _;
use std::io::Write;

use fado_elf::{
    ObjectFile, RelocType, SHF_FLAG_LETTERS, SHN_ABS, SHN_COMMON, SHN_UNDEF, STT_SECTION,
    SectionKind, Symbol, read_reloc_table, symbol_binding_name, symbol_type_name,
    symbol_visibility_name,
};

use crate::Result;

/// Flag letters of a section, in `readelf` order.
#[must_use]
pub fn flag_letters(flags: u32) -> String {
    SHF_FLAG_LETTERS
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|&(_, letter)| letter)
        .collect()
}

fn section_type_name(kind: SectionKind) -> String {
    kind.name()
        .map_or_else(|| format!("0x{:x}", kind.raw()), str::to_string)
}

fn section_index_name(shndx: u16) -> String {
    match shndx {
        SHN_UNDEF => "UND".to_string(),
        SHN_ABS => "ABS".to_string(),
        SHN_COMMON => "COM".to_string(),
        index => index.to_string(),
    }
}

/// Symbol name, or the section name for unnamed section symbols.
fn display_symbol_name<'a>(file: &'a ObjectFile, symbol: &Symbol) -> Result<&'a str> {
    let name = file.symbol_name(symbol)?;
    if name.is_empty() && symbol.sym_type() == STT_SECTION {
        return Ok(file.section_name(usize::from(symbol.shndx))?);
    }
    Ok(name)
}

/// Section header table.
pub fn write_sections<W: Write>(out: &mut W, file: &ObjectFile) -> Result<()> {
    writeln!(out, "There are {} section headers:", file.sections.len())?;
    writeln!(out)?;
    writeln!(
        out,
        "  [Nr] Name              Type            Addr     Off    Size   ES Flg Lk Inf Al"
    )?;
    for (index, section) in file.sections.iter().enumerate() {
        writeln!(
            out,
            "  [{index:2}] {:<17} {:<15} {:08x} {:06x} {:06x} {:02x} {:>3} {:2} {:3} {:2}",
            file.section_name(index)?,
            section_type_name(section.kind),
            section.addr,
            section.offset,
            section.size,
            section.entsize,
            flag_letters(section.flags),
            section.link,
            section.info,
            section.addralign,
        )?;
    }
    writeln!(out, "Key to Flags:")?;
    let mut key = String::from(" ");
    for (bit, letter) in SHF_FLAG_LETTERS {
        let _ = write!(key, " {letter} (0x{bit:x})");
    }
    writeln!(out, "{key}")?;
    Ok(())
}

/// `.symtab` contents.
pub fn write_symbols<W: Write>(out: &mut W, file: &ObjectFile) -> Result<()> {
    writeln!(out, "Symbol table '.symtab' contains {} entries:", file.symbols.len())?;
    writeln!(out, "   Num:    Value  Size Type    Bind   Vis      Ndx Name")?;
    for (index, symbol) in file.symbols.iter().enumerate() {
        writeln!(
            out,
            "{index:6}: {:08x} {:5} {:<7} {:<6} {:<8} {:>3} {}",
            symbol.value,
            symbol.size,
            symbol_type_name(symbol.sym_type()),
            symbol_binding_name(symbol.binding()),
            symbol_visibility_name(symbol.visibility()),
            section_index_name(symbol.shndx),
            display_symbol_name(file, symbol)?,
        )?;
    }
    Ok(())
}

/// Every `SHT_REL` section, including ones the overlay table ignores.
pub fn write_relocs<W: Write>(out: &mut W, file: &ObjectFile, data: &[u8]) -> Result<()> {
    let mut any = false;
    for (index, section) in file.sections.iter().enumerate() {
        if section.kind != SectionKind::Rel {
            continue;
        }
        any = true;
        let entries = read_reloc_table(data, section.offset, section.size)?;
        writeln!(
            out,
            "\nRelocation section '{}' at offset 0x{:x} contains {} entries:",
            file.section_name(index)?,
            section.offset,
            entries.len()
        )?;
        writeln!(out, " Offset     Info    Type            Symbol")?;
        for rel in &entries {
            let ty = RelocType::from_code(rel.reloc_type()).map_or_else(
                || format!("<unknown {}>", rel.reloc_type()),
                |t| format!("R_{}", t.name()),
            );
            let symbol = match file.symbols.get(rel.symbol() as usize) {
                Some(symbol) => display_symbol_name(file, symbol)?,
                None => "<bad symbol index>",
            };
            writeln!(out, "{:08x}  {:08x} {ty:<15} {symbol}", rel.offset, rel.info)?;
        }
    }
    if !any {
        writeln!(out, "\nThere are no relocations in this file.")?;
    }
    Ok(())
}
