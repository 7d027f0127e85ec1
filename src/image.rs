//! Section layout of a PE image, used to turn virtual addresses into section offsets.

use object::{BinaryFormat, Object, ObjectSection};
use std::fmt;
use std::path::Path;

pub enum Error {
    IO(std::io::Error),
    Object(object::Error),
    NotPe(BinaryFormat),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IO(err) => f.write_fmt(format_args!("Failed to read image: '{err}'.")),
            Self::Object(err) => f.write_fmt(format_args!("Failed to parse image: '{err}'.")),
            Self::NotPe(format) => {
                f.write_fmt(format_args!("Expected a PE image, found {format:?}."))
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl From<object::Error> for Error {
    fn from(error: object::Error) -> Self {
        Error::Object(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Section {
    /// 1-based, as in the image's section table.
    index: u16,
    start: u64,
    end: u64,
}

#[derive(Debug)]
pub struct Image {
    /// Sections sorted by address.
    sections: Vec<Section>,
    is_64: bool,
}

impl Image {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is only read while parsing and dropped before returning.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Self::parse(&map)
    }

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let obj = object::File::parse(data)?;
        if obj.format() != BinaryFormat::Pe {
            return Err(Error::NotPe(obj.format()));
        }

        let mut sections = Vec::new();
        for (idx, section) in obj.sections().enumerate() {
            let name = section.name().unwrap_or("unnamed");
            let index = match u16::try_from(idx + 1) {
                Ok(index) => index,
                Err(..) => break,
            };

            let start = section.address();
            let end = start.saturating_add(section.size());

            log::trace!("[image::parse] section {index} {name} <{start:x}..{end:x}>.");
            sections.push(Section { index, start, end });
        }

        Ok(Self::from_sections(sections, obj.is_64()))
    }

    fn from_sections(mut sections: Vec<Section>, is_64: bool) -> Self {
        sections.sort_unstable_by_key(|s| s.start);
        Self { sections, is_64 }
    }

    pub fn is_64(&self) -> bool {
        self.is_64
    }

    /// Section index and offset of a virtual address.
    pub fn resolve(&self, addr: u64) -> Option<(u16, u32)> {
        let idx = self.sections.partition_point(|s| s.start <= addr).checked_sub(1)?;
        let section = self.sections[idx];

        if addr >= section.end {
            return None;
        }

        let offset = u32::try_from(addr - section.start).ok()?;
        Some((section.index, offset))
    }
}
