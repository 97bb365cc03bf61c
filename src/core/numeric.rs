//! Prefix-aware number scanning with residue detection.
//!
//! Scanners read the longest valid number at the start of the text and
//! report where they stopped, leaving the caller to decide whether the
//! remaining bytes are acceptable. Whole numbers may be written in hex
//! (`0x1F`) or binary (`0b101`) as well as decimal.

/// Whitespace as the protocol understands it (space, `\t`, `\n`, `\v`, `\f`, `\r`).
#[inline]
pub(crate) fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

/// Strip leading whitespace.
pub(crate) fn trim_start(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_space(b)).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Strip trailing whitespace.
pub(crate) fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| !is_space(b)).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Strip whitespace at both ends.
pub(crate) fn trim(bytes: &[u8]) -> &[u8] {
    trim_end(trim_start(bytes))
}

/// An integer read from the start of some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerScan {
    /// A leading `-` was present.
    pub negative: bool,
    /// Absolute value, saturated at `u64::MAX`.
    pub magnitude: u64,
    /// The digits did not fit in 64 bits.
    pub overflowed: bool,
    /// Byte offset just past the last digit.
    pub end: usize,
}

impl IntegerScan {
    /// Signed value, if it fits in an `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        if self.overflowed {
            return None;
        }
        if self.negative {
            0i64.checked_sub_unsigned(self.magnitude)
        } else {
            i64::try_from(self.magnitude).ok()
        }
    }

    /// Unsigned value, if it is not negative. `-0` is accepted.
    pub fn to_u64(&self) -> Option<u64> {
        if self.overflowed || (self.negative && self.magnitude != 0) {
            return None;
        }
        Some(self.magnitude)
    }

    /// Lossy widening used by the float scanner.
    pub fn to_f64(&self) -> f64 {
        let value = self.magnitude as f64;
        if self.negative { -value } else { value }
    }
}

/// Detect a `0x`/`0X` or `0b`/`0B` prefix.
///
/// The prefix only counts when at least one byte follows it.
fn radix_prefix(text: &[u8]) -> Option<u32> {
    match text {
        [b'0', b'x' | b'X', _, ..] => Some(16),
        [b'0', b'b' | b'B', _, ..] => Some(2),
        _ => None,
    }
}

/// Scan an integer at the start of `text`.
///
/// Decimal literals may carry leading whitespace and a sign. Prefixed
/// literals must have their digits immediately after the prefix. Returns
/// `None` when no digit was read.
///
/// # Examples
///
/// ```
/// use bevy_keyhole::core::scan_integer;
///
/// let scan = scan_integer(b"0x1Fzz").unwrap();
/// assert_eq!(scan.to_i64(), Some(31));
/// assert_eq!(scan.end, 4);
///
/// assert!(scan_integer(b"abc").is_none());
/// ```
pub fn scan_integer(text: &[u8]) -> Option<IntegerScan> {
    let (radix, mut pos, mut negative) = match radix_prefix(text) {
        Some(radix) => (radix, 2, false),
        None => {
            let mut pos = text.iter().position(|&b| !is_space(b)).unwrap_or(text.len());
            let mut negative = false;
            match text.get(pos) {
                Some(b'-') => {
                    negative = true;
                    pos += 1;
                }
                Some(b'+') => pos += 1,
                _ => {}
            }
            (10, pos, negative)
        }
    };

    let digits_start = pos;
    let mut magnitude: u64 = 0;
    let mut overflowed = false;
    while let Some(digit) = text.get(pos).and_then(|&b| char::from(b).to_digit(radix)) {
        match magnitude
            .checked_mul(u64::from(radix))
            .and_then(|m| m.checked_add(u64::from(digit)))
        {
            Some(next) => magnitude = next,
            None => {
                magnitude = u64::MAX;
                overflowed = true;
            }
        }
        pos += 1;
    }

    if pos == digits_start {
        return None;
    }
    if magnitude == 0 {
        negative = false;
    }

    Some(IntegerScan {
        negative,
        magnitude,
        overflowed,
        end: pos,
    })
}

/// Scan a floating-point number at the start of `text`.
///
/// Hex and binary prefixed literals are read as integers and widened.
/// Otherwise accepts decimal notation with optional fraction and exponent,
/// plus `inf`, `infinity` and `nan` in any case. Returns the value and the
/// byte offset just past it, or `None` when nothing numeric was read.
pub fn scan_float(text: &[u8]) -> Option<(f64, usize)> {
    if radix_prefix(text).is_some() {
        return scan_integer(text).map(|scan| (scan.to_f64(), scan.end));
    }

    let start = text.iter().position(|&b| !is_space(b)).unwrap_or(text.len());
    let mut pos = start;
    if matches!(text.get(pos), Some(b'+' | b'-')) {
        pos += 1;
    }

    let rest = &text[pos..];
    let special = ["infinity", "inf", "nan"].into_iter().find(|word| {
        rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word.as_bytes())
    });

    if let Some(word) = special {
        pos += word.len();
    } else {
        let count_digits =
            |from: usize| text[from..].iter().take_while(|b| b.is_ascii_digit()).count();

        let int_digits = count_digits(pos);
        pos += int_digits;
        let mut frac_digits = 0;
        if text.get(pos) == Some(&b'.') {
            frac_digits = count_digits(pos + 1);
            if int_digits > 0 || frac_digits > 0 {
                pos += 1 + frac_digits;
            }
        }
        if int_digits == 0 && frac_digits == 0 {
            return None;
        }

        // Only take the exponent if at least one digit follows it
        if matches!(text.get(pos), Some(b'e' | b'E')) {
            let mut exp = pos + 1;
            if matches!(text.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_digits = count_digits(exp);
            if exp_digits > 0 {
                pos = exp + exp_digits;
            }
        }
    }

    let literal = std::str::from_utf8(&text[start..pos]).ok()?;
    literal.parse::<f64>().ok().map(|value| (value, pos))
}
