//! Transcoder between C++ mangling schemes.
//!
//! Symbols harvested from binaries built by GCC-family toolchains are mangled with the
//! Itanium C++ ABI, whereas Microsoft debuggers only understand names mangled by MSVC.
//! [`parse`] turns an Itanium name into a [`Symbol`] and [`emit`] writes it out again.
//!
//! ```
//! let symbol = symbols::parse(b"_Z3addii").unwrap();
//! assert_eq!(symbols::emit(&symbol, symbols::Scheme::Msvc).unwrap(), "?add@@YAXHH@Z");
//! ```

use std::borrow::Cow;

mod ast;
mod error;
pub mod itanium;
pub mod msvc;

pub use ast::*;
pub use error::{Error, Result};

/// Mangling schemes a [`Symbol`] can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Itanium,
    Msvc,
}

/// Parse an Itanium mangled function name.
pub fn parse(input: &[u8]) -> Result<Symbol> {
    itanium::parse(input)
}

/// Mangle a symbol using the given scheme.
pub fn emit(symbol: &Symbol, scheme: Scheme) -> Result<String> {
    match scheme {
        Scheme::Msvc => msvc::emit(symbol),
        Scheme::Itanium => Err(Error::UnsupportedScheme),
    }
}

/// Translate an Itanium name to MSVC, handing back the raw name if that isn't possible.
pub fn transcode(raw: &str) -> Cow<str> {
    transcode_with(raw, &msvc::Options::default())
}

pub fn transcode_with<'a>(raw: &'a str, opts: &msvc::Options) -> Cow<'a, str> {
    let transcoded = parse(raw.as_bytes()).and_then(|symbol| msvc::emit_with(&symbol, opts));

    match transcoded {
        Ok(name) => Cow::Owned(name),
        Err(err) => {
            if err.is_malformed() {
                log::trace!("[symbols::transcode] failed to transcode '{raw}': {err}.");
            }
            Cow::Borrowed(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcoding() {
        assert_eq!(transcode("_Z3addii"), "?add@@YAXHH@Z");
        assert_eq!(transcode("main"), "main");
        assert_eq!(transcode("_Z3fooIi"), "_Z3fooIi");
        assert!(matches!(transcode("WinMain"), Cow::Borrowed(_)));
    }

    #[test]
    fn transcoding_64bit() {
        let opts = msvc::Options { ptr64: true };
        assert_eq!(transcode_with("_ZNK3Foo3getEv", &opts), "?get@Foo@@QEBAXXZ");
    }

    #[test]
    fn itanium_emission_is_unsupported() {
        let symbol = parse(b"_Z3addii").unwrap();
        assert_eq!(emit(&symbol, Scheme::Itanium), Err(Error::UnsupportedScheme));
    }
}
