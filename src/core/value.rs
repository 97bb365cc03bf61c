//! Typed values that can be exposed through the keyhole.
//!
//! Each supported type carries a parse/render strategy pair through the
//! [`Exposable`] trait. The set is closed: signed and unsigned integers,
//! floats, `bool`, [`Char8`] and `String`.

use super::error::{ParseError, ParseResult};
use super::literal::{
    FLOAT_PRECISION, Quote, write_char_numeric, write_display, write_float_literal,
    write_str_literal,
};
use super::numeric::{IntegerScan, is_space, scan_float, scan_integer, trim_end};

/// Whether and how a variable may be written by incoming commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteMode {
    /// Queries only; assignments are answered with a `ReadOnly` error.
    ReadOnly,
    /// Assignments are applied without a reply.
    #[default]
    Silent,
    /// Assignments are applied and the new value is echoed back.
    Verbose,
}

/// Value family, which decides parsing and rendering behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Signed integers (decimal, `0x`, `0b`).
    Signed,
    /// Unsigned integers (decimal, `0x`, `0b`).
    Unsigned,
    /// Floating point, fixed four decimals on output.
    Float,
    /// Booleans: any integer, or `true`/`false` in any case.
    Bool,
    /// Single bytes, rendered numerically.
    Char,
    /// Quoted strings.
    Text,
}

impl ValueKind {
    /// Check if values of this kind appear in plotter output.
    #[inline]
    pub const fn is_plottable(self) -> bool {
        !matches!(self, ValueKind::Text)
    }
}

/// Trait for types that can be bound to a key.
///
/// Implemented for `i8`..`i64`, `isize`, `u8`..`u64`, `usize`, `f32`,
/// `f64`, `bool`, [`Char8`] and `String`.
pub trait Exposable: Sized {
    /// Value family.
    const KIND: ValueKind;

    /// Type name used in `BadValue` messages.
    const TYPE_NAME: &'static str;

    /// Parse value text (leading whitespace already removed).
    ///
    /// Trailing whitespace is accepted, any other trailing text is an error.
    fn parse_value(text: &[u8]) -> ParseResult<Self>;

    /// Append the wire rendering of the value.
    ///
    /// Plotter output never quotes anything.
    fn render(&self, out: &mut Vec<u8>, plotter: bool);

    /// Render into a fresh string.
    fn render_to_string(&self, plotter: bool) -> String {
        let mut out = Vec::new();
        self.render(&mut out, plotter);
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Accept `value` only if nothing but whitespace follows `end`.
fn reject_residue(text: &[u8], end: usize) -> ParseResult<()> {
    let rest = &text[end..];
    if rest.iter().all(|&b| is_space(b)) {
        Ok(())
    } else {
        Err(ParseError::Trailing(String::from_utf8_lossy(trim_end(rest)).into_owned()))
    }
}

/// Scan a whole integer literal, rejecting residue.
fn scan_whole_integer(text: &[u8]) -> ParseResult<IntegerScan> {
    let scan = scan_integer(text).ok_or(ParseError::NoDigits)?;
    reject_residue(text, scan.end)?;
    Ok(scan)
}

macro_rules! impl_signed {
    ($($t:ty),* $(,)?) => {$(
        impl Exposable for $t {
            const KIND: ValueKind = ValueKind::Signed;
            const TYPE_NAME: &'static str = stringify!($t);

            fn parse_value(text: &[u8]) -> ParseResult<Self> {
                scan_whole_integer(text)?
                    .to_i64()
                    .and_then(|v| <$t>::try_from(v).ok())
                    .ok_or(ParseError::OutOfRange(Self::TYPE_NAME))
            }

            fn render(&self, out: &mut Vec<u8>, _plotter: bool) {
                write_display(out, self);
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),* $(,)?) => {$(
        impl Exposable for $t {
            const KIND: ValueKind = ValueKind::Unsigned;
            const TYPE_NAME: &'static str = stringify!($t);

            fn parse_value(text: &[u8]) -> ParseResult<Self> {
                scan_whole_integer(text)?
                    .to_u64()
                    .and_then(|v| <$t>::try_from(v).ok())
                    .ok_or(ParseError::OutOfRange(Self::TYPE_NAME))
            }

            fn render(&self, out: &mut Vec<u8>, _plotter: bool) {
                write_display(out, self);
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

impl Exposable for f64 {
    const KIND: ValueKind = ValueKind::Float;
    const TYPE_NAME: &'static str = "f64";

    fn parse_value(text: &[u8]) -> ParseResult<Self> {
        let (value, end) = scan_float(text).ok_or(ParseError::NoDigits)?;
        reject_residue(text, end)?;
        Ok(value)
    }

    fn render(&self, out: &mut Vec<u8>, plotter: bool) {
        let quote = if plotter { None } else { Some(Quote::Double) };
        write_float_literal(out, *self, FLOAT_PRECISION, quote);
    }
}

impl Exposable for f32 {
    const KIND: ValueKind = ValueKind::Float;
    const TYPE_NAME: &'static str = "f32";

    fn parse_value(text: &[u8]) -> ParseResult<Self> {
        f64::parse_value(text).map(|v| v as f32)
    }

    fn render(&self, out: &mut Vec<u8>, plotter: bool) {
        f64::from(*self).render(out, plotter);
    }
}

impl Exposable for bool {
    const KIND: ValueKind = ValueKind::Bool;
    const TYPE_NAME: &'static str = "bool";

    fn parse_value(text: &[u8]) -> ParseResult<Self> {
        if let Some(scan) = scan_integer(text) {
            if reject_residue(text, scan.end).is_ok() {
                return Ok(scan.magnitude != 0);
            }
        }
        let word = trim_end(text);
        if word.eq_ignore_ascii_case(b"true") {
            Ok(true)
        } else if word.eq_ignore_ascii_case(b"false") {
            Ok(false)
        } else {
            Err(ParseError::MalformedLiteral)
        }
    }

    fn render(&self, out: &mut Vec<u8>, _plotter: bool) {
        out.push(if *self { b'1' } else { b'0' });
    }
}

/// A single byte, the way a microcontroller `char` behaves.
///
/// Assignable as a quoted character (`'a'`, `'\n'`, `'\x7F'`) or as any
/// integer in `-128..=255`. Always rendered as a signed 8-bit number, so
/// `'a'` reads back as `97` and `0xFF` as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Char8(pub u8);

impl Char8 {
    /// Wrap a byte.
    #[inline]
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    /// The raw byte.
    #[inline]
    pub const fn byte(self) -> u8 {
        self.0
    }
}

impl From<u8> for Char8 {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl From<Char8> for u8 {
    fn from(c: Char8) -> Self {
        c.0
    }
}

impl Exposable for Char8 {
    const KIND: ValueKind = ValueKind::Char;
    const TYPE_NAME: &'static str = "char";

    fn parse_value(text: &[u8]) -> ParseResult<Self> {
        if let Some(rest) = text.strip_prefix(b"'") {
            return match trim_end(rest) {
                [byte, b'\''] => Ok(Char8(*byte)),
                _ => Err(ParseError::MalformedLiteral),
            };
        }
        let value = scan_whole_integer(text)?
            .to_i64()
            .filter(|v| (-128..=255).contains(v))
            .ok_or(ParseError::OutOfRange(Self::TYPE_NAME))?;
        Ok(Char8(value as u8))
    }

    fn render(&self, out: &mut Vec<u8>, _plotter: bool) {
        write_char_numeric(out, self.0);
    }
}

impl Exposable for String {
    const KIND: ValueKind = ValueKind::Text;
    const TYPE_NAME: &'static str = "String";

    fn parse_value(text: &[u8]) -> ParseResult<Self> {
        let (&open, rest) = text.split_first().ok_or(ParseError::MalformedLiteral)?;
        if Quote::from_byte(open).is_none() {
            return Err(ParseError::MalformedLiteral);
        }
        match trim_end(rest).split_last() {
            Some((&close, content)) if close == open => {
                String::from_utf8(content.to_vec()).map_err(|_| ParseError::InvalidUtf8)
            }
            _ => Err(ParseError::MalformedLiteral),
        }
    }

    fn render(&self, out: &mut Vec<u8>, _plotter: bool) {
        write_str_literal(out, self.as_bytes(), Some(Quote::Double));
    }
}
