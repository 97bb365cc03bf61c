//! Literal rendering for the wire format.
//!
//! Everything written here is valid inside a JSON document and also
//! evaluates as a Python literal: non-printable bytes are escaped, and
//! non-finite floats become quoted tokens when quoting is requested.

/// Quote character wrapped around rendered strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    /// `'...'`
    Single,
    /// `"..."`, the only JSON-legal choice.
    Double,
}

impl Quote {
    /// The delimiter byte.
    #[inline]
    pub const fn byte(self) -> u8 {
        match self {
            Quote::Single => b'\'',
            Quote::Double => b'"',
        }
    }

    /// Map a delimiter byte back to a quote kind.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'\'' => Some(Quote::Single),
            b'"' => Some(Quote::Double),
            _ => None,
        }
    }
}

/// Decimal places used for variable values on the wire.
pub const FLOAT_PRECISION: usize = 4;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Render bytes as an escaped string literal.
///
/// Escapes `\t \r \n \0 \\`, the active quote character, and any other
/// non-printable byte as `\xHH`. With `quote == None` nothing is wrapped
/// and no quote character is escaped.
pub fn write_str_literal(out: &mut Vec<u8>, bytes: &[u8], quote: Option<Quote>) {
    let delimiter = quote.map(Quote::byte);
    if let Some(d) = delimiter {
        out.push(d);
    }
    write_escaped(out, bytes, delimiter);
    if let Some(d) = delimiter {
        out.push(d);
    }
}

/// Escape bytes for the inside of a `quote`-delimited literal without
/// writing the delimiters.
pub fn write_str_escaped(out: &mut Vec<u8>, bytes: &[u8], quote: Quote) {
    write_escaped(out, bytes, Some(quote.byte()));
}

fn write_escaped(out: &mut Vec<u8>, bytes: &[u8], delimiter: Option<u8>) {
    for &byte in bytes {
        match byte {
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            0 => out.extend_from_slice(b"\\0"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b if Some(b) == delimiter => out.extend_from_slice(&[b'\\', b]),
            0x20..=0x7E => out.push(byte),
            _ => out.extend_from_slice(&[
                b'\\',
                b'x',
                HEX_DIGITS[usize::from(byte >> 4)],
                HEX_DIGITS[usize::from(byte & 0x0F)],
            ]),
        }
    }
}

/// Render one byte as a character literal.
pub fn write_char_literal(out: &mut Vec<u8>, byte: u8, quote: Option<Quote>) {
    write_str_literal(out, &[byte], quote);
}

/// Render one byte as a number.
///
/// Bytes are always read as signed 8-bit values, so `0xFF` renders `-1`.
pub fn write_char_numeric(out: &mut Vec<u8>, byte: u8) {
    write_display(out, byte as i8);
}

/// Render a float with fixed precision.
///
/// Finite values are never quoted. Non-finite values render `inf` or
/// `-inf`, wrapped in `quote` when given. NaN deliberately shares the
/// `inf` token.
pub fn write_float_literal(out: &mut Vec<u8>, value: f64, precision: usize, quote: Option<Quote>) {
    if value.is_finite() {
        out.extend_from_slice(format!("{value:.precision$}").as_bytes());
        return;
    }
    let token: &[u8] = if value == f64::NEG_INFINITY { b"-inf" } else { b"inf" };
    match quote {
        Some(q) => {
            out.push(q.byte());
            out.extend_from_slice(token);
            out.push(q.byte());
        }
        None => out.extend_from_slice(token),
    }
}

/// Render anything with a `Display` impl verbatim.
pub fn write_display(out: &mut Vec<u8>, value: impl std::fmt::Display) {
    out.extend_from_slice(value.to_string().as_bytes());
}

/// Convenience wrapper returning the rendered string literal.
///
/// # Examples
///
/// ```
/// use bevy_keyhole::core::{to_literal, Quote};
///
/// assert_eq!(to_literal(b"tab\there", Some(Quote::Double)), r#""tab\there""#);
/// assert_eq!(to_literal(b"\x08", None), r"\x08");
/// ```
pub fn to_literal(bytes: &[u8], quote: Option<Quote>) -> String {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    write_str_literal(&mut out, bytes, quote);
    // Rendered literals only ever contain printable ASCII
    String::from_utf8_lossy(&out).into_owned()
}
