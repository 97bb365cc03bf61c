//! Messages re-broadcast from the keyhole session.
//!
//! Systems that care about remote changes read these instead of polling
//! their own variables.

use bevy::prelude::*;

/// Sent after a remote assignment was applied to an exposed variable.
///
/// # Examples
///
/// ```ignore
/// fn on_gain_change(mut events: MessageReader<VariableAssignedEvent>) {
///     for event in events.read() {
///         if &*event.key == "gain" {
///             info!("gain is now {}", event.value);
///         }
///     }
/// }
/// ```
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct VariableAssignedEvent {
    /// The variable's key.
    pub key: Box<str>,
    /// The new value, rendered as it would be on the wire.
    pub value: String,
}

impl VariableAssignedEvent {
    /// Create a new assignment event.
    pub fn new(key: impl Into<Box<str>>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Sent after an exposed command was claimed.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct CommandReceivedEvent {
    /// The command text.
    pub command: Box<str>,
}

impl CommandReceivedEvent {
    /// Create a new command event.
    pub fn new(command: impl Into<Box<str>>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Plugin that registers all keyhole messages.
pub struct KeyholeEventsPlugin;

impl Plugin for KeyholeEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<VariableAssignedEvent>()
            .add_message::<CommandReceivedEvent>();
    }
}
