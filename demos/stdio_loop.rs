//! Bare control loop over stdin/stdout, no Bevy.
//!
//! Simulates a heater chasing a setpoint and exposes its state.
//!
//! Run with: `RUST_LOG=bevy_keyhole=trace cargo run --example stdio_loop --no-default-features`
//!
//! Try:
//! - `?` - Dump every variable
//! - `setpoint = 40` - Change the target temperature
//! - `label = "lab oven"` - Rename the device
//! - `period = 1` - Dump every second (`period = 0` stops it)
//! - `temperature = 0` - Rejected, read-only
//! - `reset` - Cool down instantly

use std::thread;
use std::time::Duration;

use bevy_keyhole::core::{ChannelStream, Keyhole, WriteMode};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut keyhole = Keyhole::new(ChannelStream::stdio());

    let mut temperature = 20.0f64;
    let mut setpoint = 25.0f64;
    let mut gain = 0.05f32;
    let mut ticks = 0u64;
    let mut label = String::from("heater");

    while !keyhole.stream().is_closed() {
        let mut heating = temperature < setpoint;
        temperature += if heating { f64::from(gain) } else { -0.01 };
        ticks += 1;

        if keyhole.begin() {
            keyhole.variable_with("temperature", &mut temperature, WriteMode::ReadOnly);
            keyhole.variable_with("setpoint", &mut setpoint, WriteMode::Verbose);
            keyhole.variable("gain", &mut gain);
            keyhole.variable_with("heating", &mut heating, WriteMode::ReadOnly);
            keyhole.variable_with("ticks", &mut ticks, WriteMode::ReadOnly);
            keyhole.variable("label", &mut label);
            keyhole.expose_auto_report("period", WriteMode::Verbose);
            if keyhole.command("reset") {
                temperature = 20.0;
                keyhole.line(|w| {
                    w.put("reset after ").put(ticks).put(" ticks");
                });
            }
            keyhole.end();
        }

        thread::sleep(Duration::from_millis(10));
    }
}
