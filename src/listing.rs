//! Symbol listings, one `<address> <name>` pair per line.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Virtual address that still has to be resolved against an image.
    Virtual(u64),
    /// 1-based section index and the offset into that section.
    Section { index: u16, offset: u32 },
}

#[derive(Debug, PartialEq, Eq)]
pub struct Entry<'a> {
    pub location: Location,
    pub name: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    MissingName { line: usize },
    BadAddress { line: usize, addr: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName { line } => write!(f, "Line {line} has no symbol name."),
            Self::BadAddress { line, addr } => {
                write!(f, "Line {line} has an invalid address '{addr}'.")
            }
        }
    }
}

fn hex<T: TryFrom<u64>>(s: &str) -> Option<T> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    let value = u64::from_str_radix(s, 16).ok()?;
    T::try_from(value).ok()
}

fn location(addr: &str) -> Option<Location> {
    match addr.split_once(':') {
        Some((index, offset)) => Some(Location::Section {
            index: hex(index)?,
            offset: hex(offset)?,
        }),
        None => hex(addr).map(Location::Virtual),
    }
}

/// Parse every non-empty, non-comment line. Columns past the name are ignored.
pub fn parse(src: &str) -> Vec<Result<Entry<'_>, Error>> {
    let mut entries = Vec::new();

    for (idx, line) in src.lines().enumerate() {
        let line_nr = idx + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let mut columns = line.split_whitespace();
        let addr = match columns.next() {
            Some(addr) => addr,
            None => continue,
        };

        let entry = match (location(addr), columns.next()) {
            (None, _) => Err(Error::BadAddress {
                line: line_nr,
                addr: addr.to_string(),
            }),
            (Some(_), None) => Err(Error::MissingName { line: line_nr }),
            (Some(location), Some(name)) => Ok(Entry { location, name }),
        };

        entries.push(entry);
    }

    entries
}

/// Output line for a resolved symbol.
pub fn format(index: u16, offset: u32, name: &str) -> String {
    format!("{index:04X}:{offset:08X} {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_address_forms() {
        let src = "0x401000 _Z3addii\n0002:0000001c _ZN3Foo3barEv 00402000 f foo.o\n";

        assert_eq!(
            parse(src),
            vec![
                Ok(Entry {
                    location: Location::Virtual(0x401000),
                    name: "_Z3addii"
                }),
                Ok(Entry {
                    location: Location::Section {
                        index: 2,
                        offset: 0x1c
                    },
                    name: "_ZN3Foo3barEv"
                }),
            ]
        );
    }

    #[test]
    fn comments_and_blanks() {
        let src = "# header\n\n   \n; another\n401000 main";
        let entries = parse(src);

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0],
            Ok(Entry {
                location: Location::Virtual(0x401000),
                name: "main"
            })
        );
    }

    #[test]
    fn bad_lines() {
        let entries = parse("zzz main\n401000\n10000:0 big_section\n1:100000000 big_offset");

        assert_eq!(
            entries,
            vec![
                Err(Error::BadAddress { line: 1, addr: "zzz".to_string() }),
                Err(Error::MissingName { line: 2 }),
                Err(Error::BadAddress { line: 3, addr: "10000:0".to_string() }),
                Err(Error::BadAddress { line: 4, addr: "1:100000000".to_string() }),
            ]
        );
    }

    #[test]
    fn formatting() {
        assert_eq!(format(1, 0x1c, "?add@@YAXHH@Z"), "0001:0000001C ?add@@YAXHH@Z");
    }
}
