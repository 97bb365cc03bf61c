//! Key matching for completed commands.
//!
//! Matching is byte-for-byte and case-sensitive. Whitespace around `=` is
//! ignored.

use super::numeric::trim_start;

/// Outcome of matching a command against one variable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableMatch<'a> {
    /// The command is not about this key.
    NoMatch,
    /// Bare `key` (or `key =` with nothing after it): a read request.
    Query,
    /// `key = value`, carrying the value text with leading whitespace removed.
    Assign(&'a [u8]),
}

/// Match `command` against `key`.
///
/// The command must start with the key. What follows, after optional
/// whitespace, must be either nothing or `=`. Trailing whitespace of the
/// value text is left for the value parser to judge.
///
/// # Examples
///
/// ```
/// use bevy_keyhole::core::{match_variable, VariableMatch};
///
/// assert_eq!(match_variable(b"gain", b"gain"), VariableMatch::Query);
/// assert_eq!(match_variable(b"gain = 2.5", b"gain"), VariableMatch::Assign(b"2.5"));
/// assert_eq!(match_variable(b"gainx = 1", b"gain"), VariableMatch::NoMatch);
/// ```
pub fn match_variable<'a>(command: &'a [u8], key: &[u8]) -> VariableMatch<'a> {
    let Some(rest) = command.strip_prefix(key) else {
        return VariableMatch::NoMatch;
    };
    let rest = trim_start(rest);
    let value = match rest.split_first() {
        None => return VariableMatch::Query,
        Some((b'=', value)) => trim_start(value),
        Some(_) => return VariableMatch::NoMatch,
    };
    if value.is_empty() {
        VariableMatch::Query
    } else {
        VariableMatch::Assign(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_query() {
        assert_eq!(match_variable(b"foo", b"foo"), VariableMatch::Query);
        assert_eq!(match_variable(b"foo   ", b"foo"), VariableMatch::Query);
    }

    #[test]
    fn test_empty_assignment_is_query() {
        assert_eq!(match_variable(b"foo =", b"foo"), VariableMatch::Query);
        assert_eq!(match_variable(b"foo =   ", b"foo"), VariableMatch::Query);
    }

    #[test]
    fn test_assignment() {
        assert_eq!(match_variable(b"foo=1", b"foo"), VariableMatch::Assign(b"1"));
        assert_eq!(match_variable(b"foo \t= \t 1 ", b"foo"), VariableMatch::Assign(b"1 "));
        assert_eq!(
            match_variable(b"bar = \"a = b\"", b"bar"),
            VariableMatch::Assign(b"\"a = b\"")
        );
    }

    #[test]
    fn test_prefix_is_not_enough() {
        assert_eq!(match_variable(b"foobar", b"foo"), VariableMatch::NoMatch);
        assert_eq!(match_variable(b"foo bar", b"foo"), VariableMatch::NoMatch);
        assert_eq!(match_variable(b"fo", b"foo"), VariableMatch::NoMatch);
    }

    #[test]
    fn test_shorter_key_against_longer_command() {
        assert_eq!(match_variable(b"a = 5", b"a"), VariableMatch::Assign(b"5"));
        assert_eq!(match_variable(b"a = 5", b"ab"), VariableMatch::NoMatch);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(match_variable(b"Foo", b"foo"), VariableMatch::NoMatch);
    }

    #[test]
    fn test_empty_command_never_matches() {
        assert_eq!(match_variable(b"", b"foo"), VariableMatch::NoMatch);
    }
}
