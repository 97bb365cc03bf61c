//! The variable protocol engine.
//!
//! One [`Keyhole`] serves one stream. Each control-loop iteration is a
//! cycle:
//!
//! 1. [`Keyhole::begin`] reads the bytes already available. It returns
//!    `true` once a command completes (or the auto-report timer fires).
//! 2. Every exposer call ([`Keyhole::variable`], [`Keyhole::command`], ...)
//!    gets a chance to claim the command. The first match wins and consumes
//!    it.
//! 3. [`Keyhole::end`] closes an open full-state dump and reports a command
//!    that nobody claimed.
//!
//! # Examples
//!
//! ```
//! use bevy_keyhole::core::{Keyhole, MemoryStream, WriteMode};
//!
//! let stream = MemoryStream::new();
//! let mut keyhole = Keyhole::new(stream.clone());
//! let mut gain = 1.5f64;
//! let mut count = 0u32;
//!
//! stream.push_input("gain = 2.25;");
//! if keyhole.begin() {
//!     keyhole.variable("gain", &mut gain);
//!     keyhole.variable_with("count", &mut count, WriteMode::ReadOnly);
//!     keyhole.end();
//! }
//! assert_eq!(gain, 2.25);
//!
//! stream.push_input("?\n");
//! if keyhole.begin() {
//!     keyhole.variable("gain", &mut gain);
//!     keyhole.variable_with("count", &mut count, WriteMode::ReadOnly);
//!     keyhole.end();
//! }
//! assert_eq!(stream.take_output_string(), "{\"gain\": 2.2500, \"count\": 0}\n");
//! ```

use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::error::{ERROR_MSG_KEY, ERROR_TYPE_KEY, ErrorKind};
use super::literal::{Quote, write_str_escaped, write_str_literal};
use super::matcher::{VariableMatch, match_variable};
use super::schedule::{AutoReport, interval_from_secs};
use super::stream::ByteStream;
use super::tokenizer::CommandTokenizer;
use super::value::{Exposable, WriteMode};
use super::writer::{Format, LineWriter, QuoteStyle};
use crate::config::KeyholeConfig;

/// Command that starts a full-state dump.
pub const LIST_ALL_COMMAND: &[u8] = b"?";

/// Protocol engine bound to one byte stream.
#[derive(Debug)]
pub struct Keyhole<S> {
    stream: S,
    tokenizer: CommandTokenizer,
    pending: Vec<u8>,
    // 0 = no dump in progress, otherwise 1 + entries written so far
    list_all: usize,
    dump: Vec<u8>,
    auto_report: AutoReport,
    plotter_mode: bool,
    clock: Instant,
    last_begin: Instant,
    write_error: Option<io::Error>,
}

impl<S: ByteStream> Keyhole<S> {
    /// Create an engine with auto-report disabled and normal output.
    pub fn new(stream: S) -> Self {
        let now = Instant::now();
        Self {
            stream,
            tokenizer: CommandTokenizer::new(),
            pending: Vec::new(),
            list_all: 0,
            dump: Vec::new(),
            auto_report: AutoReport::default(),
            plotter_mode: false,
            clock: now,
            last_begin: now,
            write_error: None,
        }
    }

    /// Create an engine from a configuration.
    pub fn with_config(stream: S, config: &KeyholeConfig) -> Self {
        let mut keyhole = Self::new(stream);
        keyhole.set_auto_report(config.auto_report());
        keyhole.set_plotter_mode(config.plotter_mode);
        keyhole
    }

    /// Start a cycle using the engine's own monotonic clock.
    pub fn begin(&mut self) -> bool {
        let now = u64::try_from(self.clock.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.begin_at(now)
    }

    /// Start a cycle at an explicit timestamp in microseconds.
    ///
    /// Consumes available bytes up to and including the first terminator.
    /// Returns `true` if a command completed or the auto-report fired.
    pub fn begin_at(&mut self, now_micros: u64) -> bool {
        self.last_begin = Instant::now();

        while let Some(byte) = self.stream.read_byte() {
            let Some(command) = self.tokenizer.push(byte) else {
                continue;
            };
            trace!("keyhole command: {:?}", String::from_utf8_lossy(&command));
            if command == LIST_ALL_COMMAND {
                self.start_listing();
            } else {
                self.pending = command;
            }
            return true;
        }

        if self.auto_report.poll(now_micros) {
            trace!("keyhole auto-report fired at {}us", now_micros);
            self.start_listing();
            return true;
        }
        false
    }

    fn start_listing(&mut self) {
        self.pending.clear();
        self.dump.clear();
        self.list_all = 1;
    }

    /// Expose a variable with [`WriteMode::Silent`].
    pub fn variable<T: Exposable>(&mut self, key: &str, value: &mut T) -> bool {
        self.variable_with(key, value, WriteMode::Silent)
    }

    /// Expose a variable for this cycle.
    ///
    /// Adds it to an active dump, answers a query for `key`, or applies an
    /// assignment. Returns `true` only if `value` was assigned.
    pub fn variable_with<T: Exposable>(
        &mut self,
        key: &str,
        value: &mut T,
        mode: WriteMode,
    ) -> bool {
        if self.list_all > 0 {
            self.list_entry(key, &*value);
        }
        if self.pending.is_empty() {
            return false;
        }

        let command = std::mem::take(&mut self.pending);
        let text = match match_variable(&command, key.as_bytes()) {
            VariableMatch::NoMatch => {
                self.pending = command;
                return false;
            }
            VariableMatch::Query => {
                self.report(key, &*value);
                return false;
            }
            VariableMatch::Assign(text) => text,
        };

        if mode == WriteMode::ReadOnly {
            debug!("rejected write to read-only keyhole variable '{}'", key);
            self.error_line(ErrorKind::ReadOnly, |w| {
                w.put("cannot change the '").put(key).put("' variable because it is read-only");
            });
            return false;
        }

        match T::parse_value(text) {
            Ok(parsed) => {
                *value = parsed;
                debug!("keyhole variable '{}' assigned", key);
                if mode == WriteMode::Verbose {
                    self.report(key, &*value);
                }
                true
            }
            Err(err) => {
                debug!("rejected value for keyhole variable '{}': {}", key, err);
                self.error_line(ErrorKind::BadValue, |w| {
                    w.put("failed to interpret argument as type '")
                        .put(T::TYPE_NAME)
                        .put("' when setting the '")
                        .put(key)
                        .put("' variable");
                });
                false
            }
        }
    }

    /// Claim the pending command if it is exactly `cmd`.
    pub fn command(&mut self, cmd: &str) -> bool {
        if self.pending.is_empty() || self.pending != cmd.as_bytes() {
            return false;
        }
        self.pending.clear();
        true
    }

    /// Expose the auto-report interval itself as an `f64` seconds variable.
    ///
    /// Zero or negative values disable the auto-report.
    pub fn expose_auto_report(&mut self, key: &str, mode: WriteMode) -> bool {
        let mut secs = self.auto_report.interval().as_secs_f64();
        let assigned = self.variable_with(key, &mut secs, mode);
        if assigned {
            self.set_auto_report(interval_from_secs(secs));
        }
        assigned
    }

    /// Finish the cycle.
    ///
    /// Writes the dump line if one is open, then reports an unclaimed
    /// command as `BadKey`. Returns `true` if that error was written.
    pub fn end(&mut self) -> bool {
        if self.list_all > 0 {
            let mut line = std::mem::take(&mut self.dump);
            if !self.plotter_mode {
                if self.list_all == 1 {
                    line.push(b'{');
                }
                line.push(b'}');
            }
            self.list_all = 0;
            self.emit_line(line);
        }

        if self.pending.is_empty() {
            return false;
        }
        let command = std::mem::take(&mut self.pending);
        debug!("unrecognized keyhole command: {:?}", String::from_utf8_lossy(&command));
        self.error("failed to recognize command", ErrorKind::BadKey);
        true
    }

    /// Write a structured error object.
    pub fn error(&mut self, message: impl AsRef<str>, kind: impl AsRef<str>) {
        self.error_line(kind, |w| {
            w.put(message.as_ref());
        });
    }

    /// Write a structured error whose message is composed piecewise.
    ///
    /// Everything written through `w` lands escaped inside the message
    /// string; the object is closed after `f` returns.
    pub fn error_line<R>(
        &mut self,
        kind: impl AsRef<str>,
        f: impl FnOnce(&mut LineWriter<'_>) -> R,
    ) -> R {
        let mut line = Vec::new();
        line.extend_from_slice(b"{\"");
        line.extend_from_slice(ERROR_TYPE_KEY.as_bytes());
        line.extend_from_slice(b"\": ");
        write_str_literal(&mut line, kind.as_ref().as_bytes(), Some(Quote::Double));
        line.extend_from_slice(b", \"");
        line.extend_from_slice(ERROR_MSG_KEY.as_bytes());
        line.extend_from_slice(b"\": \"");

        let format = Format::new().quote(QuoteStyle::Escaped).closing("\"}");
        let result = {
            let mut writer = LineWriter::new(&mut line, format);
            let result = f(&mut writer);
            writer.finish();
            result
        };
        self.emit_line(line);
        result
    }

    /// Write one free-form line composed with a [`LineWriter`].
    ///
    /// The line end and flush always follow once `f` returns.
    pub fn line<R>(&mut self, f: impl FnOnce(&mut LineWriter<'_>) -> R) -> R {
        let mut line = Vec::new();
        let result = {
            let mut writer = LineWriter::new(&mut line, Format::new());
            let result = f(&mut writer);
            writer.finish();
            result
        };
        self.emit_line(line);
        result
    }

    fn report<T: Exposable>(&mut self, key: &str, value: &T) {
        let mut line = Vec::new();
        if self.plotter_mode {
            if !T::KIND.is_plottable() {
                return;
            }
            line.extend_from_slice(key.as_bytes());
            line.push(b':');
            value.render(&mut line, true);
        } else {
            line.extend_from_slice(b"{\"");
            write_str_escaped(&mut line, key.as_bytes(), Quote::Double);
            line.extend_from_slice(b"\": ");
            value.render(&mut line, false);
            line.push(b'}');
        }
        self.emit_line(line);
    }

    fn list_entry<T: Exposable>(&mut self, key: &str, value: &T) {
        let first = self.list_all == 1;
        if self.plotter_mode {
            if !T::KIND.is_plottable() {
                return;
            }
            if !first {
                self.dump.push(b',');
            }
            self.dump.extend_from_slice(key.as_bytes());
            self.dump.push(b':');
            value.render(&mut self.dump, true);
        } else {
            let opener: &[u8] = if first { b"{\"" } else { b", \"" };
            self.dump.extend_from_slice(opener);
            write_str_escaped(&mut self.dump, key.as_bytes(), Quote::Double);
            self.dump.extend_from_slice(b"\": ");
            value.render(&mut self.dump, false);
        }
        self.list_all += 1;
    }

    fn emit_line(&mut self, mut line: Vec<u8>) {
        line.push(b'\n');
        let result = self.stream.write_all(&line).and_then(|()| self.stream.flush());
        if let Err(err) = result {
            warn!("keyhole stream write failed: {}", err);
            if self.write_error.is_none() {
                self.write_error = Some(err);
            }
        }
    }

    /// Take the first write failure since the last call.
    pub fn take_write_error(&mut self) -> Option<io::Error> {
        self.write_error.take()
    }

    /// Microseconds since the last `begin`.
    pub fn elapsed_micros(&self) -> u64 {
        u64::try_from(self.last_begin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    /// Auto-report interval. Zero means disabled.
    pub fn auto_report(&self) -> Duration {
        self.auto_report.interval()
    }

    pub fn set_auto_report(&mut self, interval: Duration) {
        self.auto_report.set_interval(interval);
    }

    pub fn plotter_mode(&self) -> bool {
        self.plotter_mode
    }

    pub fn set_plotter_mode(&mut self, enabled: bool) {
        self.plotter_mode = enabled;
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// The completed command still waiting for an exposer.
    pub fn pending_command(&self) -> Option<&[u8]> {
        (!self.pending.is_empty()).then_some(self.pending.as_slice())
    }

    /// Check if a full-state dump is being collected this cycle.
    pub fn is_listing(&self) -> bool {
        self.list_all > 0
    }

    /// The tokenizer's in-progress state.
    pub fn tokenizer(&self) -> &CommandTokenizer {
        &self.tokenizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Char8, MemoryStream};

    struct Vars {
        foo: f64,
        count: i32,
        flag: bool,
        name: String,
        letter: Char8,
    }

    impl Default for Vars {
        fn default() -> Self {
            Self {
                foo: 1.23,
                count: 7,
                flag: true,
                name: "dev".to_string(),
                letter: Char8(b'a'),
            }
        }
    }

    fn setup() -> (MemoryStream, Keyhole<MemoryStream>) {
        let stream = MemoryStream::new();
        let keyhole = Keyhole::new(stream.clone());
        (stream, keyhole)
    }

    /// One control-loop iteration exposing every field of `vars`.
    fn cycle(keyhole: &mut Keyhole<MemoryStream>, vars: &mut Vars, now: u64) -> bool {
        if !keyhole.begin_at(now) {
            return false;
        }
        keyhole.variable("foo", &mut vars.foo);
        keyhole.variable_with("count", &mut vars.count, WriteMode::Verbose);
        keyhole.variable_with("flag", &mut vars.flag, WriteMode::ReadOnly);
        keyhole.variable("name", &mut vars.name);
        keyhole.variable("letter", &mut vars.letter);
        keyhole.end();
        true
    }

    fn run(input: &str) -> (String, Vars) {
        let (stream, mut keyhole) = setup();
        let mut vars = Vars::default();
        stream.push_input(input);
        while cycle(&mut keyhole, &mut vars, 0) {}
        (stream.take_output_string(), vars)
    }

    #[test]
    fn test_bare_query() {
        let (out, _) = run("foo\n");
        assert_eq!(out, "{\"foo\": 1.2300}\n");
    }

    #[test]
    fn test_silent_assignment() {
        let (out, vars) = run("foo = 2.5;");
        assert_eq!(out, "");
        assert_eq!(vars.foo, 2.5);
    }

    #[test]
    fn test_verbose_assignment_echoes() {
        let (out, vars) = run("count=0x10;");
        assert_eq!(vars.count, 16);
        assert_eq!(out, "{\"count\": 16}\n");
    }

    #[test]
    fn test_string_with_escape() {
        let (out, vars) = run("name = \"tab\\there\";");
        assert_eq!(out, "");
        assert_eq!(vars.name, "tab\there");
        assert_eq!(vars.name.len(), 8);
    }

    #[test]
    fn test_string_query_is_escaped() {
        let (stream, mut keyhole) = setup();
        let mut name = "a\"b\n".to_string();
        stream.push_input("name;");
        assert!(keyhole.begin_at(0));
        keyhole.variable("name", &mut name);
        assert!(!keyhole.end());
        assert_eq!(stream.take_output_string(), "{\"name\": \"a\\\"b\\n\"}\n");
    }

    #[test]
    fn test_char_assignment() {
        let (out, vars) = run("letter = 'z'; letter;");
        assert_eq!(vars.letter, Char8(b'z'));
        assert_eq!(out, "{\"letter\": 122}\n");
    }

    #[test]
    fn test_read_only_rejected() {
        let (out, vars) = run("flag = 0;");
        assert!(vars.flag);
        assert_eq!(
            out,
            "{\"_KEYHOLE_ERROR_TYPE\": \"ReadOnly\", \"_KEYHOLE_ERROR_MSG\": \
             \"cannot change the 'flag' variable because it is read-only\"}\n"
        );
    }

    #[test]
    fn test_read_only_still_answers_queries() {
        let (out, _) = run("flag;");
        assert_eq!(out, "{\"flag\": 1}\n");
    }

    #[test]
    fn test_bad_value() {
        let (out, vars) = run("count = 5abc;");
        assert_eq!(vars.count, 7);
        assert_eq!(
            out,
            "{\"_KEYHOLE_ERROR_TYPE\": \"BadValue\", \"_KEYHOLE_ERROR_MSG\": \
             \"failed to interpret argument as type 'i32' when setting the 'count' variable\"}\n"
        );
    }

    #[test]
    fn test_malformed_string_is_bad_value() {
        let (out, vars) = run("name = unquoted;");
        assert_eq!(vars.name, "dev");
        assert!(out.contains("\"BadValue\""));
        assert!(out.contains("type 'String'"));
    }

    #[test]
    fn test_out_of_range_is_bad_value() {
        let (stream, mut keyhole) = setup();
        let mut small = 5u8;
        stream.push_input("small = 300;");
        assert!(keyhole.begin_at(0));
        assert!(!keyhole.variable("small", &mut small));
        keyhole.end();
        assert_eq!(small, 5);
        assert!(stream.take_output_string().contains("type 'u8'"));
    }

    #[test]
    fn test_bad_key() {
        let (out, _) = run("nope = 1;");
        assert_eq!(
            out,
            concat!(
                "{\"_KEYHOLE_ERROR_TYPE\": \"BadKey\", ",
                "\"_KEYHOLE_ERROR_MSG\": \"failed to recognize command\"}\n",
            )
        );
    }

    #[test]
    fn test_empty_command_is_silent() {
        let (out, _) = run(";;\n  \n");
        assert_eq!(out, "");
    }

    #[test]
    fn test_first_match_wins() {
        let (stream, mut keyhole) = setup();
        let mut a = 0i32;
        let mut ab = 0i32;
        let mut a_again = 0i32;
        stream.push_input("a = 5;");
        assert!(keyhole.begin_at(0));
        assert!(!keyhole.variable("ab", &mut ab));
        assert!(keyhole.variable("a", &mut a));
        assert!(!keyhole.variable("a", &mut a_again));
        assert!(!keyhole.end());
        assert_eq!((a, ab, a_again), (5, 0, 0));
        assert_eq!(stream.take_output_string(), "");
    }

    #[test]
    fn test_shorter_key_then_longer() {
        let (stream, mut keyhole) = setup();
        let mut a = 0i32;
        let mut ab = 0i32;
        stream.push_input("a = 5;");
        assert!(keyhole.begin_at(0));
        assert!(keyhole.variable("a", &mut a));
        assert_eq!(keyhole.pending_command(), None);
        assert!(!keyhole.variable("ab", &mut ab));
        keyhole.end();
        assert_eq!((a, ab), (5, 0));
    }

    #[test]
    fn test_list_all() {
        let (out, _) = run("?\n");
        assert_eq!(
            out,
            "{\"foo\": 1.2300, \"count\": 7, \"flag\": 1, \"name\": \"dev\", \"letter\": 97}\n"
        );
    }

    #[test]
    fn test_list_all_empty() {
        let (stream, mut keyhole) = setup();
        stream.push_input("?;");
        assert!(keyhole.begin_at(0));
        assert!(keyhole.is_listing());
        assert!(!keyhole.end());
        assert!(!keyhole.is_listing());
        assert_eq!(stream.take_output_string(), "{}\n");
    }

    #[test]
    fn test_plotter_list_all_skips_strings() {
        let (stream, mut keyhole) = setup();
        keyhole.set_plotter_mode(true);
        let mut vars = Vars::default();
        stream.push_input("?;");
        assert!(cycle(&mut keyhole, &mut vars, 0));
        assert_eq!(stream.take_output_string(), "foo:1.2300,count:7,flag:1,letter:97\n");
    }

    #[test]
    fn test_plotter_query() {
        let (stream, mut keyhole) = setup();
        keyhole.set_plotter_mode(true);
        let mut vars = Vars::default();
        stream.push_input("count;name;");
        assert!(cycle(&mut keyhole, &mut vars, 0));
        assert!(cycle(&mut keyhole, &mut vars, 0));
        assert_eq!(stream.take_output_string(), "count:7\n");
    }

    #[test]
    fn test_plotter_non_finite_unquoted() {
        let (stream, mut keyhole) = setup();
        let mut x = f64::NAN;
        let mut y = f64::NEG_INFINITY;

        stream.push_input("?;");
        assert!(keyhole.begin_at(0));
        keyhole.variable("x", &mut x);
        keyhole.variable("y", &mut y);
        keyhole.end();
        assert_eq!(stream.take_output_string(), "{\"x\": \"inf\", \"y\": \"-inf\"}\n");

        keyhole.set_plotter_mode(true);
        stream.push_input("?;");
        assert!(keyhole.begin_at(0));
        keyhole.variable("x", &mut x);
        keyhole.variable("y", &mut y);
        keyhole.end();
        assert_eq!(stream.take_output_string(), "x:inf,y:-inf\n");
    }

    #[test]
    fn test_byte_by_byte_feed() {
        let (stream, mut keyhole) = setup();
        let mut x = 0i32;
        for byte in "x=1".bytes() {
            stream.push_input([byte]);
            assert!(!keyhole.begin_at(0));
            assert!(!keyhole.variable("x", &mut x));
            assert!(!keyhole.end());
        }
        stream.push_input(";");
        assert!(keyhole.begin_at(0));
        assert_eq!(keyhole.pending_command(), Some(&b"x=1"[..]));
        assert!(keyhole.variable("x", &mut x));
        keyhole.end();
        assert_eq!(x, 1);
    }

    #[test]
    fn test_one_command_per_cycle() {
        let (stream, mut keyhole) = setup();
        stream.push_input("a;b;");
        assert!(keyhole.begin_at(0));
        assert_eq!(keyhole.pending_command(), Some(&b"a"[..]));
        assert_eq!(stream.pending_input(), 2);
        assert!(keyhole.command("a"));
        keyhole.end();

        assert!(keyhole.begin_at(0));
        assert_eq!(keyhole.pending_command(), Some(&b"b"[..]));
    }

    #[test]
    fn test_command() {
        let (stream, mut keyhole) = setup();
        stream.push_input("reset;reset now;");

        assert!(keyhole.begin_at(0));
        assert!(!keyhole.command("rese"));
        assert!(keyhole.command("reset"));
        assert!(!keyhole.command("reset"));
        assert!(!keyhole.end());

        assert!(keyhole.begin_at(0));
        assert!(!keyhole.command("reset"));
        assert!(keyhole.end());
        assert!(stream.take_output_string().contains("BadKey"));
    }

    #[test]
    fn test_auto_report() {
        let (stream, mut keyhole) = setup();
        keyhole.set_auto_report(Duration::from_micros(2_000_000));
        let mut vars = Vars::default();

        assert!(!cycle(&mut keyhole, &mut vars, 1_000_000));
        assert!(cycle(&mut keyhole, &mut vars, 2_000_000));
        assert!(!cycle(&mut keyhole, &mut vars, 3_999_999));
        assert!(cycle(&mut keyhole, &mut vars, 4_000_000));

        let out = stream.take_output_string();
        assert_eq!(out.lines().count(), 2);
        assert!(out.starts_with("{\"foo\": 1.2300, "));
    }

    #[test]
    fn test_incoming_command_preempts_auto_report() {
        let (stream, mut keyhole) = setup();
        keyhole.set_auto_report(Duration::from_secs(1));
        stream.push_input("foo;");
        assert!(keyhole.begin_at(5_000_000));
        assert!(!keyhole.is_listing());
        assert_eq!(keyhole.pending_command(), Some(&b"foo"[..]));
    }

    #[test]
    fn test_expose_auto_report() {
        let (stream, mut keyhole) = setup();
        stream.push_input("period = 0.5; period; period = -1;");

        assert!(keyhole.begin_at(0));
        assert!(keyhole.expose_auto_report("period", WriteMode::Silent));
        keyhole.end();
        assert_eq!(keyhole.auto_report(), Duration::from_millis(500));

        assert!(keyhole.begin_at(0));
        keyhole.expose_auto_report("period", WriteMode::Silent);
        keyhole.end();
        assert_eq!(stream.take_output_string(), "{\"period\": 0.5000}\n");

        assert!(keyhole.begin_at(0));
        assert!(keyhole.expose_auto_report("period", WriteMode::Silent));
        keyhole.end();
        assert_eq!(keyhole.auto_report(), Duration::ZERO);
    }

    #[test]
    fn test_free_form_error() {
        let (stream, mut keyhole) = setup();
        keyhole.error("motor \"A\" stalled", "Fault");
        assert_eq!(
            stream.take_output_string(),
            concat!(
                "{\"_KEYHOLE_ERROR_TYPE\": \"Fault\", ",
                "\"_KEYHOLE_ERROR_MSG\": \"motor \\\"A\\\" stalled\"}\n",
            )
        );
    }

    #[test]
    fn test_error_line_composition() {
        let (stream, mut keyhole) = setup();
        let code = keyhole.error_line(ErrorKind::BadValue, |w| {
            w.put("limit ").put(2.5f64).put(" exceeded\n");
            42
        });
        assert_eq!(code, 42);
        assert_eq!(
            stream.take_output_string(),
            concat!(
                "{\"_KEYHOLE_ERROR_TYPE\": \"BadValue\", ",
                "\"_KEYHOLE_ERROR_MSG\": \"limit 2.50 exceeded\\n\"}\n",
            )
        );
    }

    #[test]
    fn test_line_finalizes_on_early_return() {
        let (stream, mut keyhole) = setup();
        let result: Result<(), &str> = keyhole.line(|w| {
            w.put("partial");
            if w.precision() == 2 {
                return Err("stopped");
            }
            w.put(" never");
            Ok(())
        });
        assert_eq!(result, Err("stopped"));
        assert_eq!(stream.take_output_string(), "partial\n");
        assert_eq!(stream.flush_count(), 1);
    }

    #[test]
    fn test_every_line_is_flushed() {
        let (out, _) = run("foo;count;?;");
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_with_config() {
        let config = KeyholeConfig {
            auto_report_secs: 0.25,
            plotter_mode: true,
        };
        let keyhole = Keyhole::with_config(MemoryStream::new(), &config);
        assert_eq!(keyhole.auto_report(), Duration::from_millis(250));
        assert!(keyhole.plotter_mode());
    }

    struct FailingStream;

    impl ByteStream for FailingStream {
        fn read_byte(&mut self) -> Option<u8> {
            None
        }

        fn write_all(&mut self, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_kept() {
        let mut keyhole = Keyhole::new(FailingStream);
        keyhole.error("first", "Fault");
        keyhole.error("second", "Fault");
        let err = keyhole.take_write_error().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(keyhole.take_write_error().is_none());
    }

    #[test]
    fn test_tokenizer_state_survives_cycles() {
        let (stream, mut keyhole) = setup();
        let mut name = String::new();
        stream.push_input("name = \"a;b");
        assert!(!keyhole.begin_at(0));
        assert_eq!(keyhole.tokenizer().quote(), Some(b'"'));
        keyhole.end();

        stream.push_input("\";");
        assert!(keyhole.begin_at(0));
        assert!(keyhole.variable("name", &mut name));
        keyhole.end();
        assert_eq!(name, "a;b");
    }
}
