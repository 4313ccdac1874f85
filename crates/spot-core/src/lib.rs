//! Orientation-driven spatial audio spotlight.
//!
//! Ranks sound targets by angular distance from where the device points,
//! shares a small pool of playback resources among the nearest ones, maps
//! ranking and focus into volume levels, and runs the dwell-to-focus reveal.
//! Device services are reached only through the traits in [`capability`].

pub mod capability;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod idle;
pub mod pool;
pub mod sensor;
pub mod target;
pub mod timer;
pub mod volume;

pub use capability::*;
pub use config::*;
pub use engine::*;
pub use error::{Result, SpotError};
pub use focus::{FocusController, FocusPhase};
pub use geometry::*;
pub use idle::IdleMonitor;
pub use pool::*;
pub use sensor::*;
pub use target::*;
pub use timer::*;
pub use volume::VolumeLevels;
