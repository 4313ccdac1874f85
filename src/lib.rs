//! Host runtime for the spotlight engine.
//!
//! Supplies what a device would: a clock and timer queue, simulated playback
//! resources with asynchronous loading, ambience, haptics and a recording
//! presentation sink. Orientation input is replayed from traces.

pub mod devices;
pub mod feed;
pub mod scheduler;
pub mod session;
pub mod trace;

pub use devices::{AmbienceBed, AudioLibrary, DeviceLog, Presentation};
pub use feed::{load_startup, parse_startup_json, parse_startup_toml};
pub use scheduler::{DelayQueue, SchedulerHandle, VirtualClock};
pub use session::{Session, SessionReport};
pub use trace::{
    load_trace, parse_trace, yaw_direction, yaw_sample, TraceAction, TraceBuilder, TraceEvent,
};
