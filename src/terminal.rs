//! Terminal backend for headless devices and simulators.
//!
//! Serves the keyhole protocol over the process's stdin/stdout. A background
//! thread reads stdin so the frame loop never waits for input.

use bevy::prelude::*;

use crate::config::KeyholeConfig;
use crate::core::ChannelStream;
use crate::plugin::KeyholePlugin;

/// Plugin that serves the keyhole session on stdin/stdout.
#[derive(Default)]
pub struct TerminalPlugin {
    /// Session configuration.
    pub config: KeyholeConfig,
}

impl TerminalPlugin {
    /// Create a terminal plugin with `config`.
    pub fn new(config: KeyholeConfig) -> Self {
        Self { config }
    }
}

impl Plugin for TerminalPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            KeyholePlugin::with_stream(ChannelStream::stdio()).config(self.config.clone()),
        );
    }
}
