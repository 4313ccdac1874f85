use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use spot_core::{EngineParams, SensorKind};
use spot_host::{
    load_startup, load_trace, trace::write_trace, AudioLibrary, Session, TraceBuilder, TraceEvent,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Sensor {
    Rotation,
    Geomagnetic,
}

impl From<Sensor> for SensorKind {
    fn from(s: Sensor) -> Self {
        match s {
            Sensor::Rotation => SensorKind::RotationVector,
            Sensor::Geomagnetic => SensorKind::GeomagneticRotationVector,
        }
    }
}

/// Replay an orientation trace through the spotlight engine on simulated devices.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Startup data (`.toml` or `.json`) with configuration and targets
    startup: PathBuf,

    /// JSON-lines trace; a sweep across every target is synthesized when omitted
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Write the trace that was replayed to this path
    #[arg(long)]
    dump_trace: Option<PathBuf>,

    /// Fix the reveal order
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated asset load latency
    #[arg(long, default_value_t = 150)]
    latency_ms: u64,

    /// Sensors the simulated device offers (repeatable)
    #[arg(long = "sensor", value_enum, default_values_t = [Sensor::Rotation])]
    sensors: Vec<Sensor>,
}

/// Start, then dwell on each target long enough to focus it.
fn synthesize(session: &Session) -> Vec<TraceEvent> {
    let params = session.engine().params();
    let config = session.engine().config();
    let dwell_ms = ((params.seconds_pre_focus + config.time_to_focus) * 1000.0) as u64 + 500;

    let mut builder = TraceBuilder::new().touch(0);
    let mut t = 20;
    for target in session.engine().registry().iter() {
        // Horizontal heading of the target, inverse of `yaw_direction`
        let yaw = (-target.direction.x).atan2(target.direction.y).to_degrees();
        builder = builder.hold(t, t + dwell_ms, 20, yaw);
        t += dwell_ms + 20;
    }
    builder.pause(t).wait(t + 3000).build()
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let startup = load_startup(&args.startup)?;
    let params = EngineParams {
        seed: args.seed,
        ..Default::default()
    };
    let library = AudioLibrary::with_latency(Duration::from_millis(args.latency_ms));
    let sensors: Vec<SensorKind> = args.sensors.iter().copied().map(Into::into).collect();
    let mut session = Session::new(startup, params, library, &sensors)?;

    let trace = match &args.trace {
        Some(path) => load_trace(path)?,
        None => synthesize(&session),
    };
    if let Some(path) = &args.dump_trace {
        std::fs::write(path, write_trace(&trace)?)
            .with_context(|| format!("writing trace {}", path.display()))?;
    }
    log::info!("replaying {} events", trace.len());

    let report = session.run(&trace);
    println!("{report:#?}");
    let shown = session.presentation().shown_text('_');
    if !shown.is_empty() {
        println!("focus text: {shown}");
    }
    Ok(())
}
