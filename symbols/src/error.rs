//! Custom `Error` and `Result` types for transcoding symbols.

use std::fmt;

/// Errors that can occur while parsing or emitting a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The input isn't an Itanium mangled name. Callers should pass it through untouched.
    NotMangled,

    /// The mangled symbol ends abruptly.
    UnexpectedEnd,

    /// The mangled symbol is not well-formed.
    UnexpectedText,

    /// Found a back reference that is out-of-bounds of the substitution
    /// table, or that refers to something unusable in its position.
    BadBackReference,

    /// Found a reference to a template arg that is either out-of-bounds, or in
    /// a context without template args.
    BadTemplateArgReference,

    /// A literal template argument opened inside another literal.
    NestedLiteral,

    /// A constructor or destructor without an enclosing class.
    MisplacedCtorDtor,

    /// An overflow would occur when parsing an integer in a mangled symbol.
    Overflow,

    /// Encountered too much recursion when parsing symbol.
    TooMuchRecursion,

    /// Back references expand into more nodes than a symbol is allowed to have.
    TooLarge,

    /// The symbol is well-formed but uses a construct that can't be represented.
    Unsupported,

    /// Emitting in the requested scheme isn't implemented.
    UnsupportedScheme,
}

impl Error {
    /// Whether the input was meant to be parsed but couldn't be.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Error::NotMangled | Error::UnsupportedScheme)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NotMangled => write!(f, "symbol isn't an itanium mangled name"),
            Error::UnexpectedEnd => write!(f, "mangled symbol ends abruptly"),
            Error::UnexpectedText => write!(f, "mangled symbol is not well-formed"),
            Error::BadBackReference => {
                write!(f, "back reference that is out-of-bounds of the substitution table")
            }
            Error::BadTemplateArgReference => write!(
                f,
                "reference to a template arg that is either out-of-bounds, or in a context \
                 without template args"
            ),
            Error::NestedLiteral => write!(f, "literal template argument nested in a literal"),
            Error::MisplacedCtorDtor => {
                write!(f, "constructor or destructor without an enclosing class")
            }
            Error::Overflow => write!(
                f,
                "an overflow would occur when parsing an integer in a mangled symbol"
            ),
            Error::TooMuchRecursion => {
                write!(f, "encountered too much recursion when parsing symbol")
            }
            Error::TooLarge => write!(f, "back references expand into too large of a symbol"),
            Error::Unsupported => write!(f, "symbol uses a construct that can't be transcoded"),
            Error::UnsupportedScheme => write!(f, "emitting this mangling scheme isn't supported"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = ::core::result::Result<T, Error>;

#[test]
fn size_of_error() {
    assert_eq!(
        core::mem::size_of::<Error>(),
        1,
        "We should keep the size of our Error type in check"
    );
}

#[test]
fn not_mangled_is_not_malformed() {
    assert!(!Error::NotMangled.is_malformed());
    assert!(Error::UnexpectedEnd.is_malformed());
    assert!(Error::BadBackReference.is_malformed());
}
