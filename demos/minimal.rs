//! Minimal headless keyhole example.
//!
//! Drives the session from an in-memory stream, so no terminal is needed.
//! Each frame one scripted command is served and the reply is printed.
//!
//! Run with: `cargo run --example minimal`

use bevy::prelude::*;
use bevy_keyhole::prelude::*;

const SCRIPT: &str = "speed = 2.5;speed;name = \"rover\";?;limit = 9;nope;stop;";

#[derive(Resource)]
struct Rover {
    speed: f32,
    limit: u8,
    name: String,
}

#[derive(Resource)]
struct Loopback(MemoryStream);

fn main() {
    let stream = MemoryStream::new();
    stream.push_input(SCRIPT);

    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(KeyholePlugin::with_stream(stream.clone()))
        .insert_resource(Loopback(stream))
        .insert_resource(Rover {
            speed: 0.0,
            limit: 4,
            name: "unnamed".to_string(),
        })
        .add_systems(Update, expose)
        .add_systems(Last, (print_replies, report_changes))
        .run();
}

fn expose(
    mut session: ResMut<KeyholeSession>,
    mut rover: ResMut<Rover>,
    mut exit: MessageWriter<AppExit>,
) {
    let rover = &mut *rover;
    session.variable("speed", &mut rover.speed);
    session.variable_with("limit", &mut rover.limit, WriteMode::ReadOnly);
    session.variable("name", &mut rover.name);
    if session.command("stop") {
        exit.write(AppExit::Success);
    }
}

fn print_replies(loopback: Res<Loopback>) {
    let output = loopback.0.take_output_string();
    if !output.is_empty() {
        print!("{}", output);
    }
}

fn report_changes(mut events: MessageReader<VariableAssignedEvent>) {
    for event in events.read() {
        println!("# {} changed to {}", event.key, event.value);
    }
}
