//! Terminal keyhole example.
//!
//! Serves a small simulated device over stdin/stdout, one protocol cycle
//! per frame.
//!
//! Run with: `cargo run --example terminal --features terminal`
//!
//! Commands:
//! - `?` - Dump every variable
//! - `pwm` - Query the duty cycle
//! - `pwm = 0x80` - Set the duty cycle
//! - `period = 0.5` - Dump twice a second
//! - `quit` - Exit the application

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy_keyhole::prelude::*;

#[derive(Resource)]
struct Device {
    pwm: u8,
    enabled: bool,
    mode: Char8,
    uptime: f64,
}

fn main() {
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(10))))
        .add_plugins(TerminalPlugin::default())
        .insert_resource(Device {
            pwm: 0,
            enabled: true,
            mode: Char8(b'a'),
            uptime: 0.0,
        })
        .add_systems(Update, (tick, expose).chain())
        .run();
}

fn tick(time: Res<Time>, mut device: ResMut<Device>) {
    device.uptime += time.delta_secs_f64();
}

fn expose(
    mut session: ResMut<KeyholeSession>,
    mut device: ResMut<Device>,
    mut exit: MessageWriter<AppExit>,
) {
    let device = &mut *device;
    session.variable_with("pwm", &mut device.pwm, WriteMode::Verbose);
    session.variable("enabled", &mut device.enabled);
    session.variable("mode", &mut device.mode);
    session.variable_with("uptime", &mut device.uptime, WriteMode::ReadOnly);
    session.expose_auto_report("period", WriteMode::Verbose);
    if session.command("quit") {
        exit.write(AppExit::Success);
    }
}
