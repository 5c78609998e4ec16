//! MIPS relocation types.

use std::fmt;

macro_rules! reloc_types {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// Recognized MIPS relocation type.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum RelocType {
            $($variant = $code,)*
        }

        impl RelocType {
            /// Look up a relocation type by its ELF code.
            #[must_use]
            pub const fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Name without the `R_` prefix, e.g. `MIPS_HI16`.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

reloc_types! {
    MipsNone = 0 => "MIPS_NONE",
    Mips16 = 1 => "MIPS_16",
    Mips32 = 2 => "MIPS_32",
    Rel32 = 3 => "MIPS_REL32",
    Mips26 = 4 => "MIPS_26",
    Hi16 = 5 => "MIPS_HI16",
    Lo16 = 6 => "MIPS_LO16",
    GpRel16 = 7 => "MIPS_GPREL16",
    Literal = 8 => "MIPS_LITERAL",
    Got16 = 9 => "MIPS_GOT16",
    Pc16 = 10 => "MIPS_PC16",
    Call16 = 11 => "MIPS_CALL16",
    GpRel32 = 12 => "MIPS_GPREL32",
    Shift5 = 16 => "MIPS_SHIFT5",
    Shift6 = 17 => "MIPS_SHIFT6",
    Mips64 = 18 => "MIPS_64",
    GotDisp = 19 => "MIPS_GOT_DISP",
    GotPage = 20 => "MIPS_GOT_PAGE",
    GotOfst = 21 => "MIPS_GOT_OFST",
    GotHi16 = 22 => "MIPS_GOT_HI16",
    GotLo16 = 23 => "MIPS_GOT_LO16",
    Sub = 24 => "MIPS_SUB",
    InsertA = 25 => "MIPS_INSERT_A",
    InsertB = 26 => "MIPS_INSERT_B",
    Delete = 27 => "MIPS_DELETE",
    Higher = 28 => "MIPS_HIGHER",
    Highest = 29 => "MIPS_HIGHEST",
    CallHi16 = 30 => "MIPS_CALL_HI16",
    CallLo16 = 31 => "MIPS_CALL_LO16",
    ScnDisp = 32 => "MIPS_SCN_DISP",
    Rel16 = 33 => "MIPS_REL16",
    AddImmediate = 34 => "MIPS_ADD_IMMEDIATE",
    PJump = 35 => "MIPS_PJUMP",
    RelGot = 36 => "MIPS_RELGOT",
    Jalr = 37 => "MIPS_JALR",
    TlsDtpMod32 = 38 => "MIPS_TLS_DTPMOD32",
    TlsDtpRel32 = 39 => "MIPS_TLS_DTPREL32",
    TlsDtpMod64 = 40 => "MIPS_TLS_DTPMOD64",
    TlsDtpRel64 = 41 => "MIPS_TLS_DTPREL64",
    TlsGd = 42 => "MIPS_TLS_GD",
    TlsLdm = 43 => "MIPS_TLS_LDM",
    TlsDtpRelHi16 = 44 => "MIPS_TLS_DTPREL_HI16",
    TlsDtpRelLo16 = 45 => "MIPS_TLS_DTPREL_LO16",
    TlsGotTpRel = 46 => "MIPS_TLS_GOTTPREL",
    TlsTpRel32 = 47 => "MIPS_TLS_TPREL32",
    TlsTpRel64 = 48 => "MIPS_TLS_TPREL64",
    TlsTpRelHi16 = 49 => "MIPS_TLS_TPREL_HI16",
    TlsTpRelLo16 = 50 => "MIPS_TLS_TPREL_LO16",
    GlobDat = 51 => "MIPS_GLOB_DAT",
}

impl RelocType {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RelocType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        Self::from_code(code).ok_or(code)
    }
}

impl fmt::Display for RelocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
