//! Incremental command tokenizer.
//!
//! Bytes are fed one at a time, as they become available on the stream.
//! A command ends at an unquoted `;` or newline. Inside `'...'` or `"..."`
//! terminators are ignored and backslash escapes are decoded:
//! `\n \r \t \0 \xHH` map to the corresponding byte, any other escaped
//! byte stands for itself (so `\\` and `\"` work as expected).
//!
//! The quote delimiters themselves are kept in the command text; the
//! string parser strips them when a value is assigned.

use super::numeric::{is_space, trim};

/// Escape decoding state carried between bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeState {
    /// Not inside an escape sequence.
    #[default]
    None,
    /// The previous byte was an unconsumed backslash.
    Backslash,
    /// Saw `\x`, waiting for the first hex digit.
    HexFirst,
    /// Saw `\x` and one hex digit (the stored high nibble).
    HexSecond(u8),
}

/// Byte-at-a-time command scanner.
///
/// All state lives in the instance, so input may arrive in any number of
/// pieces across separate calls without losing a partial command.
///
/// # Examples
///
/// ```
/// use bevy_keyhole::core::CommandTokenizer;
///
/// let mut tokenizer = CommandTokenizer::new();
/// let mut done = None;
/// for &byte in b"  bar = \"a;b\";" {
///     if let Some(command) = tokenizer.push(byte) {
///         done = Some(command);
///     }
/// }
/// assert_eq!(done.unwrap(), b"bar = \"a;b\"");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandTokenizer {
    partial: Vec<u8>,
    escape: EscapeState,
    quote: Option<u8>,
}

impl CommandTokenizer {
    /// Create an idle tokenizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes collected since the last terminator.
    #[inline]
    pub fn partial(&self) -> &[u8] {
        &self.partial
    }

    /// The open quote delimiter, if inside a quoted section.
    #[inline]
    pub fn quote(&self) -> Option<u8> {
        self.quote
    }

    /// Current escape decoding state.
    #[inline]
    pub fn escape(&self) -> EscapeState {
        self.escape
    }

    /// Check whether a command is partially received.
    pub fn is_idle(&self) -> bool {
        self.partial.is_empty() && self.quote.is_none() && self.escape == EscapeState::None
    }

    /// Drop any partial command and return to the idle state.
    pub fn reset(&mut self) {
        self.partial.clear();
        self.escape = EscapeState::None;
        self.quote = None;
    }

    /// Feed one byte.
    ///
    /// Returns the completed command, trimmed of surrounding whitespace,
    /// when `byte` is an unquoted terminator. The returned command may be
    /// empty (e.g. for `;;`).
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        if self.quote.is_none() && (byte == b';' || byte == b'\n') {
            let command = trim(&self.partial).to_vec();
            self.reset();
            return Some(command);
        }

        let backslash_pending = self.escape == EscapeState::Backslash;
        let marker = byte == b'\\' && !backslash_pending && self.quote.is_some();
        let mut c = byte;

        match self.escape {
            EscapeState::HexFirst => match hex_value(byte) {
                Some(high) => {
                    self.escape = EscapeState::HexSecond(high);
                    return None;
                }
                // Malformed: drop the escape, evaluate this byte normally
                None => self.escape = EscapeState::None,
            },
            EscapeState::HexSecond(high) => {
                self.escape = EscapeState::None;
                match hex_value(byte) {
                    Some(low) => c = (high << 4) | low,
                    None => self.partial.push(high),
                }
            }
            EscapeState::Backslash => {
                self.escape = EscapeState::None;
                match byte {
                    b'n' => c = b'\n',
                    b'r' => c = b'\r',
                    b't' => c = b'\t',
                    b'0' => c = 0,
                    b'x' => {
                        self.escape = EscapeState::HexFirst;
                        return None;
                    }
                    _ => {}
                }
            }
            EscapeState::None => {}
        }

        // Leading whitespace is only dropped before the first content byte
        if !marker && (!self.partial.is_empty() || !is_space(c)) {
            self.partial.push(c);
        }

        // Decoded bytes take part in quote tracking like any other byte
        match self.quote {
            None if c == b'\'' || c == b'"' => self.quote = Some(c),
            Some(q) if c == q && !backslash_pending => self.quote = None,
            _ => {}
        }

        if marker {
            self.escape = EscapeState::Backslash;
        }
        None
    }
}

/// Value of an ASCII hex digit.
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
