//! Telemetry relay node with a built-in simulated vehicle.
//!
//! Runs the relay service against the bundled kinematic simulation and
//! prints one JSON telemetry snapshot per tick to stdout. Console commands
//! (load mission / set mode) are read as JSON lines from stdin, standing in
//! for the deployment's pub/sub channel.
//!
//! Usage:
//!   cargo run --bin relay_node -- [OPTIONS]
//!
//! Options:
//!   --id <N>           Vehicle ID stamped on snapshots (default: 1)
//!   --missions <DIR>   Directory searched for mission files (default: .)
//!   --rate <HZ>        Telemetry publish rate (default: 10)
//!   --seed <N>         Simulation RNG seed (default: random)

use std::env;
use std::process;
use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use trail_relay::{
    ConsoleCommand, LocalMissionSource, RelayConfig, SimConfig, SimLink, StdoutSink,
    TelemetryRelay,
};

struct Args {
    id: u32,
    missions: String,
    rate: u32,
    seed: Option<u64>,
}

fn parse_args() -> Args {
    let mut args = Args {
        id: 1,
        missions: ".".to_string(),
        rate: 10,
        seed: None,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--id" => {
                i += 1;
                args.id = parse_arg(&raw, i, "id");
            }
            "--missions" => {
                i += 1;
                args.missions = raw
                    .get(i)
                    .unwrap_or_else(|| {
                        eprintln!("Error: --missions requires a value");
                        process::exit(1);
                    })
                    .clone();
            }
            "--rate" => {
                i += 1;
                args.rate = parse_arg(&raw, i, "rate");
            }
            "--seed" => {
                i += 1;
                args.seed = Some(parse_arg(&raw, i, "seed"));
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if args.rate == 0 {
        eprintln!("Error: rate must be at least 1");
        process::exit(1);
    }

    args
}

fn parse_arg<T: std::str::FromStr>(raw: &[String], i: usize, name: &str) -> T {
    raw.get(i)
        .unwrap_or_else(|| {
            eprintln!("Error: --{name} requires a value");
            process::exit(1);
        })
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("Error: invalid value for --{name}");
            process::exit(1);
        })
}

fn print_usage() {
    eprintln!(
        "Usage: relay_node [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --id <N>           Vehicle ID stamped on snapshots (default: 1)\n\
         \x20 --missions <DIR>   Directory searched for mission files (default: .)\n\
         \x20 --rate <HZ>        Telemetry publish rate (default: 10)\n\
         \x20 --seed <N>         Simulation RNG seed (default: random)"
    );
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();

    let config = RelayConfig {
        vehicle_id: args.id,
        tick_hz: args.rate,
        mission_dir: args.missions.clone(),
        ..Default::default()
    };

    let (event_tx, event_rx) = mpsc::channel(256);
    let (command_tx, command_rx) = mpsc::channel(16);

    let link = SimLink::new(
        SimConfig {
            seed: args.seed,
            ..Default::default()
        },
        event_tx,
    );
    link.spawn();

    let source = Arc::new(LocalMissionSource::new(&config.mission_dir));
    let relay = Arc::new(TelemetryRelay::new(config, link, source, Arc::new(StdoutSink)));

    // Console commands as JSON lines on stdin
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ConsoleCommand>(&line) {
                Ok(command) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "ignoring malformed console command"),
            }
        }
    });

    tokio::select! {
        _ = relay.run(event_rx, command_rx) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}
