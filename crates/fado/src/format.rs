//! Assembly rendering of the overlay relocation table.
//!
//! The table goes into the overlay's `.ovl` section. The four segment sizes
//! are symbols resolved when the overlay is linked; the final word is the
//! byte size of the section, which the loader reads from the end of the
//! overlay file to find the start of the table.

use std::io::{self, Write};

use crate::overlay::OverlayRelocs;

/// Words in the section besides the relocations: four segment sizes, the
/// relocation count and the trailing section size.
const FIXED_WORDS: usize = 6;

/// The section is padded to a multiple of this many words.
const ALIGN_WORDS: usize = 4;

/// Formatter configuration.
#[derive(Clone, Debug)]
pub struct FormatOptions {
    /// Prefix of the generated symbol names (`_{name}SegmentTextSize`).
    pub overlay_name: String,
    /// Comment every relocation word with its decoded fields.
    pub annotate: bool,
}

impl FormatOptions {
    #[must_use]
    pub fn new(overlay_name: impl Into<String>) -> Self {
        Self {
            overlay_name: overlay_name.into(),
            annotate: true,
        }
    }

    #[must_use]
    pub const fn with_annotations(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }
}

/// Word counts of a `.ovl` section holding `relocs` relocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableLayout {
    pub relocs: usize,
    pub padding: usize,
}

impl TableLayout {
    #[must_use]
    pub const fn new(relocs: usize) -> Self {
        let used = relocs + FIXED_WORDS;
        let padding = (ALIGN_WORDS - used % ALIGN_WORDS) % ALIGN_WORDS;
        Self { relocs, padding }
    }

    #[must_use]
    pub const fn total_words(self) -> usize {
        self.relocs + self.padding + FIXED_WORDS
    }

    /// Size of the section in bytes, the value of the trailing word.
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        self.total_words() * 4
    }
}

/// Write the `.ovl` section for `relocs`.
pub fn write_table<W: Write>(
    out: &mut W,
    relocs: &OverlayRelocs<'_>,
    options: &FormatOptions,
) -> io::Result<()> {
    let name = &options.overlay_name;
    let layout = TableLayout::new(relocs.count());

    writeln!(out, ".section .ovl")?;
    writeln!(out, "# {name}OverlayInfo")?;
    for segment in ["Text", "Data", "RoData", "Bss"] {
        writeln!(out, ".word _{name}Segment{segment}Size")?;
    }
    writeln!(out)?;
    writeln!(out, ".word {} # relocCount", layout.relocs)?;

    for (class, packed) in relocs.classes() {
        writeln!(out)?;
        writeln!(out, "# {class} RELOCS")?;
        for reloc in packed {
            let word = reloc.word;
            if options.annotate {
                let ty = word.reloc_type().map_or("?", |t| t.name());
                writeln!(
                    out,
                    ".word 0x{word:X} # {class:<6} {ty:<10} 0x{:06X} {}",
                    word.offset(),
                    reloc.symbol
                )?;
            } else {
                writeln!(out, ".word 0x{word:X}")?;
            }
        }
    }

    for _ in 0..layout.padding {
        writeln!(out, ".word 0")?;
    }

    writeln!(out)?;
    writeln!(out, ".word 0x{:08X} # {name}OverlayInfoOffset", layout.size_bytes())
}

/// Render the `.ovl` section into a string.
pub fn render_table(relocs: &OverlayRelocs<'_>, options: &FormatOptions) -> io::Result<String> {
    let mut buf = Vec::new();
    write_table(&mut buf, relocs, options)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
