//! Error types for the keyhole protocol.
//!
//! Protocol errors are never fatal: they are rendered on the wire as one
//! structured object and the offending command is discarded.

use thiserror::Error;

/// Key used for the error kind in structured error objects.
pub const ERROR_TYPE_KEY: &str = "_KEYHOLE_ERROR_TYPE";

/// Key used for the error message in structured error objects.
pub const ERROR_MSG_KEY: &str = "_KEYHOLE_ERROR_MSG";

/// Built-in protocol error kinds.
///
/// Callers may emit their own kinds through
/// [`Keyhole::error`](super::Keyhole::error); anything that is `AsRef<str>` works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No exposer recognized the completed command by the end of the cycle.
    BadKey,
    /// The value text could not be parsed as the variable's type.
    BadValue,
    /// A write was attempted against a read-only variable.
    ReadOnly,
}

impl ErrorKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadKey => "BadKey",
            ErrorKind::BadValue => "BadValue",
            ErrorKind::ReadOnly => "ReadOnly",
        }
    }
}

impl AsRef<str> for ErrorKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a value text was rejected by a typed parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No number could be read at the start of the text.
    #[error("no digits found")]
    NoDigits,

    /// A value was read but non-whitespace text follows it.
    #[error("unexpected trailing text {0:?}")]
    Trailing(String),

    /// The number does not fit the destination type.
    #[error("value out of range for {0}")]
    OutOfRange(&'static str),

    /// A quoted literal is missing its delimiters or has the wrong length.
    #[error("malformed quoted literal")]
    MalformedLiteral,

    /// A string literal decoded to bytes that are not UTF-8.
    #[error("string literal is not valid UTF-8")]
    InvalidUtf8,
}

/// Result type alias for value parsing.
pub type ParseResult<T> = Result<T, ParseError>;
