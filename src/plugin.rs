//! Bevy integration.
//!
//! [`KeyholePlugin`] owns one [`Keyhole`] engine as the [`KeyholeSession`]
//! resource and runs one protocol cycle per frame: the cycle begins in
//! `PreUpdate`, systems in `Update` expose their variables through the
//! session, and the cycle ends in `PostUpdate`.

use std::sync::{Mutex, PoisonError};

use bevy::prelude::*;

use crate::config::KeyholeConfig;
use crate::core::{ByteStream, Exposable, Keyhole, LineWriter, MemoryStream, WriteMode};
use crate::events::{CommandReceivedEvent, KeyholeEventsPlugin, VariableAssignedEvent};

/// Type-erased stream owned by the session.
pub type BoxedStream = Box<dyn ByteStream + Send + Sync>;

/// System sets bracketing the protocol cycle.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyholeSet {
    /// Reads input, in `PreUpdate`.
    Begin,
    /// Closes dumps and reports unclaimed commands, in `PostUpdate`.
    End,
}

/// The app's keyhole engine plus per-frame bookkeeping.
///
/// # Examples
///
/// ```ignore
/// #[derive(Resource)]
/// struct Gain(f64);
///
/// fn expose(mut session: ResMut<KeyholeSession>, mut gain: ResMut<Gain>) {
///     session.variable("gain", &mut gain.0);
///     if session.command("reset") {
///         gain.0 = 1.0;
///     }
/// }
/// ```
#[derive(Resource)]
pub struct KeyholeSession {
    keyhole: Keyhole<BoxedStream>,
    ready: bool,
    assigned: Vec<VariableAssignedEvent>,
    commands: Vec<CommandReceivedEvent>,
}

impl KeyholeSession {
    /// Create a session over `stream`.
    pub fn new(stream: impl ByteStream + Send + Sync + 'static, config: &KeyholeConfig) -> Self {
        Self::from_boxed(Box::new(stream), config)
    }

    fn from_boxed(stream: BoxedStream, config: &KeyholeConfig) -> Self {
        Self {
            keyhole: Keyhole::with_config(stream, config),
            ready: false,
            assigned: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Check if this frame has a command or dump to serve.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Expose a variable with [`WriteMode::Silent`].
    pub fn variable<T: Exposable>(&mut self, key: &str, value: &mut T) -> bool {
        self.variable_with(key, value, WriteMode::Silent)
    }

    /// Expose a variable for this frame. Returns `true` if it was assigned.
    pub fn variable_with<T: Exposable>(
        &mut self,
        key: &str,
        value: &mut T,
        mode: WriteMode,
    ) -> bool {
        if !self.ready {
            return false;
        }
        let assigned = self.keyhole.variable_with(key, value, mode);
        if assigned {
            self.assigned
                .push(VariableAssignedEvent::new(key, value.render_to_string(false)));
        }
        assigned
    }

    /// Claim the pending command if it is exactly `cmd`.
    pub fn command(&mut self, cmd: &str) -> bool {
        if !self.ready {
            return false;
        }
        let claimed = self.keyhole.command(cmd);
        if claimed {
            self.commands.push(CommandReceivedEvent::new(cmd));
        }
        claimed
    }

    /// Expose the auto-report period as an `f64` seconds variable.
    pub fn expose_auto_report(&mut self, key: &str, mode: WriteMode) -> bool {
        self.ready && self.keyhole.expose_auto_report(key, mode)
    }

    /// Write a structured error object.
    pub fn error(&mut self, message: impl AsRef<str>, kind: impl AsRef<str>) {
        self.keyhole.error(message, kind);
    }

    /// Write a structured error composed piecewise.
    pub fn error_line<R>(
        &mut self,
        kind: impl AsRef<str>,
        f: impl FnOnce(&mut LineWriter<'_>) -> R,
    ) -> R {
        self.keyhole.error_line(kind, f)
    }

    /// Write one free-form line.
    pub fn line<R>(&mut self, f: impl FnOnce(&mut LineWriter<'_>) -> R) -> R {
        self.keyhole.line(f)
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Keyhole<BoxedStream> {
        &self.keyhole
    }

    /// Mutable access to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut Keyhole<BoxedStream> {
        &mut self.keyhole
    }
}

/// Plugin that serves one keyhole session per app.
///
/// # Configuration
///
/// ```ignore
/// KeyholePlugin::with_stream(ChannelStream::stdio())
///     .config(KeyholeConfig::new().auto_report_secs(1.0))
/// ```
pub struct KeyholePlugin {
    stream: Mutex<Option<BoxedStream>>,
    config: KeyholeConfig,
}

impl Default for KeyholePlugin {
    fn default() -> Self {
        Self {
            stream: Mutex::new(None),
            config: KeyholeConfig::default(),
        }
    }
}

impl KeyholePlugin {
    /// Serve the protocol over `stream`.
    pub fn with_stream(stream: impl ByteStream + Send + Sync + 'static) -> Self {
        Self {
            stream: Mutex::new(Some(Box::new(stream))),
            config: KeyholeConfig::default(),
        }
    }

    /// Use `config` for the session.
    pub fn config(mut self, config: KeyholeConfig) -> Self {
        self.config = config;
        self
    }
}

impl Plugin for KeyholePlugin {
    fn build(&self, app: &mut App) {
        let taken = self.stream.lock().unwrap_or_else(PoisonError::into_inner).take();
        let stream: BoxedStream = match taken {
            Some(stream) => stream,
            None => Box::new(MemoryStream::new()),
        };

        app.insert_resource(KeyholeSession::from_boxed(stream, &self.config))
            .add_plugins(KeyholeEventsPlugin)
            .add_systems(PreUpdate, begin_cycle.in_set(KeyholeSet::Begin))
            .add_systems(PostUpdate, end_cycle.in_set(KeyholeSet::End));
    }
}

fn begin_cycle(mut session: ResMut<KeyholeSession>, time: Res<Time<Real>>) {
    let now = u64::try_from(time.elapsed().as_micros()).unwrap_or(u64::MAX);
    session.ready = session.keyhole.begin_at(now);
}

fn end_cycle(
    mut session: ResMut<KeyholeSession>,
    mut assigned: MessageWriter<VariableAssignedEvent>,
    mut commands: MessageWriter<CommandReceivedEvent>,
) {
    let session = &mut *session;
    if session.ready {
        session.keyhole.end();
        session.ready = false;
    }
    for event in session.assigned.drain(..) {
        assigned.write(event);
    }
    for event in session.commands.drain(..) {
        commands.write(event);
    }
}
