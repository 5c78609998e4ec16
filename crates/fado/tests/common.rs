//! Shared fixtures: a two-file overlay written to a temporary directory.

use std::path::{Path, PathBuf};

use fado_elf::SHT_PROGBITS;
use fado_elf::testing::{ObjectBuilder, SymbolSpec};
use tempfile::TempDir;

/// `ovl_En_Test/z_en_test.o` followed by `ovl_En_Test/z_en_test_data.o`.
pub struct Overlay {
    pub dir: TempDir,
    pub files: Vec<PathBuf>,
}

fn write(dir: &Path, name: &str, builder: &ObjectBuilder) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, builder.build()).expect("write object");
    path
}

pub fn overlay() -> Overlay {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ovl = dir.path().join("ovl_En_Test");
    std::fs::create_dir(&ovl).expect("create overlay dir");

    // text 0x100, relocations against its own function and data, a
    // reference into the second file and one to code outside the overlay
    let main = ObjectBuilder::new()
        .section(".text", SHT_PROGBITS, vec![0; 0x100])
        .section(".data", SHT_PROGBITS, vec![0; 0x20])
        .section(".rodata", SHT_PROGBITS, vec![0; 0x10])
        .rel(
            ".text",
            &[(0x10, 1, 4), (0x18, 3, 5), (0x1C, 3, 6), (0x30, 4, 4)],
        )
        .rel(".data", &[(0x0, 1, 2), (0x4, 2, 2)])
        .rel(".rodata", &[(0x8, 1, 2)])
        .symbol(SymbolSpec::global("EnTest_Init", 1))
        .symbol(SymbolSpec::global("sEnTestInfo", 2).value(0x10))
        .symbol(SymbolSpec::undefined("sEnTestData"))
        .symbol(SymbolSpec::undefined("Actor_Kill"));

    let data = ObjectBuilder::new()
        .section(".text", SHT_PROGBITS, vec![0; 0x40])
        .section(".data", SHT_PROGBITS, vec![0; 0x10])
        .rel(".text", &[(0x20, 2, 4)])
        .rel(".data", &[(0x8, 3, 2)])
        .symbol(SymbolSpec::global("sEnTestData", 2))
        .symbol(SymbolSpec::global("EnTest_Helper", 1))
        .symbol(SymbolSpec::undefined("EnTest_Init"));

    let files = vec![
        write(&ovl, "z_en_test.o", &main),
        write(&ovl, "z_en_test_data.o", &data),
    ];
    Overlay { dir, files }
}
