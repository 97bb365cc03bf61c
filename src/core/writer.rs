//! Scoped chained-output writer.
//!
//! A [`LineWriter`] only ever lives inside a closure handed to
//! [`Keyhole::line`](super::Keyhole::line) or
//! [`Keyhole::error_line`](super::Keyhole::error_line). The engine appends
//! the closing string and line end after the closure returns, then flushes
//! the stream, so a line can never be left open.

use super::literal::{
    Quote, write_char_numeric, write_display, write_float_literal, write_str_escaped,
    write_str_literal,
};
use super::value::Char8;

/// Float precision used by chained output unless overridden.
pub const DEFAULT_PRECISION: usize = 2;

/// How strings are written by a [`LineWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuoteStyle {
    /// Bytes are copied as-is.
    #[default]
    Verbatim,
    /// Escaped as if inside a `"..."` literal, without the delimiters.
    Escaped,
    /// Escaped and wrapped in `'...'`.
    Single,
    /// Escaped and wrapped in `"..."`.
    Double,
}

impl QuoteStyle {
    /// Wrapping quote, if any.
    pub fn wrapping(self) -> Option<Quote> {
        match self {
            QuoteStyle::Single => Some(Quote::Single),
            QuoteStyle::Double => Some(Quote::Double),
            QuoteStyle::Verbatim | QuoteStyle::Escaped => None,
        }
    }
}

/// Format overrides for the rest of a line.
///
/// Unset fields keep whatever the writer currently uses.
///
/// # Examples
///
/// ```
/// use bevy_keyhole::core::{Format, QuoteStyle};
///
/// let fmt = Format::new().precision(4).quote(QuoteStyle::Double);
/// assert_eq!(fmt.get_precision(), Some(4));
/// assert_eq!(fmt.get_closing(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    precision: Option<usize>,
    quote: Option<QuoteStyle>,
    closing: Option<String>,
}

impl Format {
    /// Format that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimal places for floats.
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    /// String quoting policy.
    pub fn quote(mut self, quote: QuoteStyle) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Text written before the line end.
    pub fn closing(mut self, closing: impl Into<String>) -> Self {
        self.closing = Some(closing.into());
        self
    }

    pub fn get_precision(&self) -> Option<usize> {
        self.precision
    }

    pub fn get_quote(&self) -> Option<QuoteStyle> {
        self.quote
    }

    pub fn get_closing(&self) -> Option<&str> {
        self.closing.as_deref()
    }
}

/// Chained writer for one output line.
///
/// # Examples
///
/// ```
/// use bevy_keyhole::core::{Format, Keyhole, MemoryStream, QuoteStyle};
///
/// let stream = MemoryStream::new();
/// let mut keyhole = Keyhole::new(stream.clone());
/// keyhole.line(|w| {
///     w.put("pi=").put(3.14159).put(" name=");
///     w.format(Format::new().quote(QuoteStyle::Double)).put("keyhole");
/// });
/// assert_eq!(stream.take_output_string(), "pi=3.14 name=\"keyhole\"\n");
/// ```
#[derive(Debug)]
pub struct LineWriter<'a> {
    out: &'a mut Vec<u8>,
    precision: usize,
    quote: QuoteStyle,
    closing: String,
}

impl<'a> LineWriter<'a> {
    pub(crate) fn new(out: &'a mut Vec<u8>, format: Format) -> Self {
        let mut writer = Self {
            out,
            precision: DEFAULT_PRECISION,
            quote: QuoteStyle::Verbatim,
            closing: String::new(),
        };
        writer.format(format);
        writer
    }

    /// Write one value using the current format.
    pub fn put(&mut self, value: impl Emit) -> &mut Self {
        value.emit(self);
        self
    }

    /// Apply format overrides to everything written afterwards.
    pub fn format(&mut self, format: Format) -> &mut Self {
        if let Some(precision) = format.precision {
            self.precision = precision;
        }
        if let Some(quote) = format.quote {
            self.quote = quote;
        }
        if let Some(closing) = format.closing {
            self.closing = closing;
        }
        self
    }

    /// Write bytes with no escaping at all.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    /// Write bytes under the current quoting policy.
    pub fn text(&mut self, bytes: &[u8]) -> &mut Self {
        match self.quote {
            QuoteStyle::Verbatim => self.out.extend_from_slice(bytes),
            QuoteStyle::Escaped => write_str_escaped(self.out, bytes, Quote::Double),
            style => write_str_literal(self.out, bytes, style.wrapping()),
        }
        self
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub(crate) fn finish(self) {
        self.out.extend_from_slice(self.closing.as_bytes());
    }
}

/// Values a [`LineWriter`] can write.
pub trait Emit {
    fn emit(&self, writer: &mut LineWriter<'_>);
}

impl<T: Emit + ?Sized> Emit for &T {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        (**self).emit(writer);
    }
}

impl Emit for str {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        writer.text(self.as_bytes());
    }
}

impl Emit for String {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        writer.text(self.as_bytes());
    }
}

impl Emit for [u8] {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        writer.text(self);
    }
}

macro_rules! impl_emit_integer {
    ($($t:ty),* $(,)?) => {$(
        impl Emit for $t {
            fn emit(&self, writer: &mut LineWriter<'_>) {
                write_display(writer.out, self);
            }
        }
    )*};
}

impl_emit_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Emit for f64 {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        let quote = writer.quote.wrapping();
        write_float_literal(writer.out, *self, writer.precision, quote);
    }
}

impl Emit for f32 {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        f64::from(*self).emit(writer);
    }
}

impl Emit for bool {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        writer.out.push(if *self { b'1' } else { b'0' });
    }
}

impl Emit for Char8 {
    fn emit(&self, writer: &mut LineWriter<'_>) {
        write_char_numeric(writer.out, self.0);
    }
}
