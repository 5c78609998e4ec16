//! Section classes an overlay relocation table distinguishes.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Overlay section class of a program section or relocation section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionClass {
    Text,
    Data,
    Rodata,
    /// Allocated section that is none of the above.
    Other,
}

impl SectionClass {
    /// Every class, in table order.
    pub const ALL: [Self; 4] = [Self::Text, Self::Data, Self::Rodata, Self::Other];

    const NAMES: [&'static str; 4] = ["TEXT", "DATA", "RODATA", "OTHER"];

    /// Classify a section by name, ignoring one leading `.`.
    #[must_use]
    pub fn from_section_name(name: &str) -> Self {
        let trimmed = name.strip_prefix('.').unwrap_or(name);
        if trimmed.starts_with("text") {
            Self::Text
        } else if trimmed.starts_with("data") {
            Self::Data
        } else if trimmed.starts_with("rodata") {
            Self::Rodata
        } else {
            Self::Other
        }
    }

    /// Two-bit tag stored in the top of a packed relocation word.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::Other => 0,
            Self::Text => 1,
            Self::Data => 2,
            Self::Rodata => 3,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u32) -> Self {
        match tag & 0x3 {
            1 => Self::Text,
            2 => Self::Data,
            3 => Self::Rodata,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }
}

impl fmt::Display for SectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One value per [`SectionClass`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerClass<T>([T; 4]);

impl<T> PerClass<T> {
    pub fn iter(&self) -> impl Iterator<Item = (SectionClass, &T)> {
        SectionClass::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<SectionClass> for PerClass<T> {
    type Output = T;

    fn index(&self, class: SectionClass) -> &T {
        &self.0[class.index()]
    }
}

impl<T> IndexMut<SectionClass> for PerClass<T> {
    fn index_mut(&mut self, class: SectionClass) -> &mut T {
        &mut self.0[class.index()]
    }
}
