//! A line-oriented variable exchange protocol for devices on a byte stream.
//!
//! bevy_keyhole lets a control loop expose its variables ad hoc, by key, to
//! a peer on the other end of a serial port, pipe or socket:
//!
//! - **Queries**: a bare `key` is answered with `{"key": value}`
//! - **Assignments**: `key = value` parses into the caller's storage
//! - **Dumps**: `?` (or the auto-report timer) lists every exposed variable
//! - **Errors**: one structured object per rejected command
//!
//! Commands end at an unquoted `;` or newline and may arrive a byte at a
//! time. Replies are single-line JSON, or compact `key:value` lines in
//! plotter mode.
//!
//! # Features
//!
//! - `bevy` (default): [`KeyholePlugin`] running one protocol cycle per frame
//! - `terminal`: serve the session over stdin/stdout
//! - `config-file`: RON load/save of [`KeyholeConfig`]
//! - `full`: Enable bevy + config-file
//!
//! # Quick Start
//!
//! ```
//! use bevy_keyhole::core::{Keyhole, MemoryStream, WriteMode};
//!
//! let stream = MemoryStream::new();
//! let mut keyhole = Keyhole::new(stream.clone());
//! let mut setpoint = 20.0f64;
//! let mut label = String::from("oven");
//!
//! stream.push_input("setpoint = 22.5; label\n");
//! for _ in 0..2 {
//!     if keyhole.begin() {
//!         keyhole.variable_with("setpoint", &mut setpoint, WriteMode::Verbose);
//!         keyhole.variable_with("label", &mut label, WriteMode::ReadOnly);
//!         keyhole.end();
//!     }
//! }
//!
//! assert_eq!(setpoint, 22.5);
//! assert_eq!(
//!     stream.take_output_string(),
//!     "{\"setpoint\": 22.5000}\n{\"label\": \"oven\"}\n"
//! );
//! ```
//!
//! With Bevy:
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_keyhole::prelude::*;
//!
//! #[derive(Resource)]
//! struct Setpoint(f64);
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(TerminalPlugin::default())
//!         .insert_resource(Setpoint(20.0))
//!         .add_systems(Update, expose)
//!         .run();
//! }
//!
//! fn expose(mut session: ResMut<KeyholeSession>, mut setpoint: ResMut<Setpoint>) {
//!     session.variable("setpoint", &mut setpoint.0);
//! }
//! ```

// Core module (always available, zero optional deps)
pub mod core;

pub mod config;

// Bevy integration (feature-gated)
#[cfg(feature = "bevy")]
pub mod events;
#[cfg(feature = "bevy")]
pub mod plugin;

// Terminal backend (feature-gated)
#[cfg(feature = "terminal")]
pub mod terminal;

// Re-export core types at crate root for convenience
pub use crate::core::{
    ByteStream, ChannelStream, Char8, ErrorKind, Exposable, Format, Keyhole, LineWriter,
    MemoryStream, ParseError, QuoteStyle, WriteMode,
};

pub use config::KeyholeConfig;

#[cfg(feature = "config-file")]
pub use config::{ConfigError, DEFAULT_CONFIG_FILE};

#[cfg(feature = "bevy")]
pub use events::{CommandReceivedEvent, KeyholeEventsPlugin, VariableAssignedEvent};

#[cfg(feature = "bevy")]
pub use plugin::{BoxedStream, KeyholePlugin, KeyholeSession, KeyholeSet};

#[cfg(feature = "terminal")]
pub use terminal::TerminalPlugin;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::KeyholeConfig;
    pub use crate::core::{
        ByteStream, Char8, ErrorKind, Exposable, Format, Keyhole, MemoryStream, QuoteStyle,
        WriteMode,
    };

    #[cfg(feature = "bevy")]
    pub use crate::{
        CommandReceivedEvent, KeyholePlugin, KeyholeSession, KeyholeSet, VariableAssignedEvent,
    };

    #[cfg(feature = "terminal")]
    pub use crate::TerminalPlugin;
}
