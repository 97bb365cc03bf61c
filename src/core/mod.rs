//! Core protocol types with zero optional dependencies.
//!
//! This module provides the fundamental building blocks:
//! - [`Keyhole`] - The per-stream protocol engine
//! - [`CommandTokenizer`] - Byte-at-a-time command scanner
//! - [`match_variable`] - Key matching for completed commands
//! - [`Exposable`] - Typed parse/render strategies for exposed values
//! - [`LineWriter`] - Scoped chained output with format overrides
//! - [`ByteStream`] - The non-blocking stream collaborator
//! - [`AutoReport`] - Periodic full-state dump trigger

mod engine;
mod error;
mod literal;
mod matcher;
mod numeric;
mod schedule;
mod stream;
mod tokenizer;
mod value;
mod writer;

pub use engine::{Keyhole, LIST_ALL_COMMAND};
pub use error::{ERROR_MSG_KEY, ERROR_TYPE_KEY, ErrorKind, ParseError, ParseResult};
pub use literal::{
    FLOAT_PRECISION, Quote, to_literal, write_char_literal, write_char_numeric, write_float_literal,
    write_str_escaped, write_str_literal,
};
pub use matcher::{VariableMatch, match_variable};
pub use numeric::{IntegerScan, scan_float, scan_integer};
pub use schedule::{AutoReport, interval_from_secs};
pub use stream::{ByteStream, ChannelStream, MemoryStream};
pub use tokenizer::{CommandTokenizer, EscapeState};
pub use value::{Char8, Exposable, ValueKind, WriteMode};
pub use writer::{DEFAULT_PRECISION, Emit, Format, LineWriter, QuoteStyle};
