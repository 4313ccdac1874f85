use std::time::Duration;

// Shared tuning constants for the allocation and focus engine.

// Focus timing
pub const SECONDS_PRE_FOCUS: f32 = 1.0; // dwell before the reveal starts
pub const HAPTIC_PULSE: Duration = Duration::from_millis(100); // confirmation buzz on focus

// Experience lifecycle
pub const PAUSE_TRANSITION_SECONDS: f32 = 2.0; // Pausing -> Ready

// Spot volume mapping (targets holding a resource)
pub const SPOT_VOLUME_MAX: f32 = 0.8; // level when aimed dead-on and not focused
pub const FOCUS_VOLUME: f32 = 1.0;
pub const FOCUS_OTHERS_VOLUME: f32 = 0.0;

// Ambience crossfade
pub const AMBIENCE_FLOOR: f32 = 0.2; // level when aimed dead-on at a target
pub const AMBIENCE_SPAN: f32 = 0.8;
pub const AMBIENCE_FULL: f32 = 1.0;

// Longest duration a configuration may ask for (one day)
pub const MAX_CONFIG_SECONDS: f32 = 86_400.0;

// Offset given to targets before the first valid sample arrives
pub const UNRANKED_OFFSET_DEG: f32 = 180.0;

// Seed mixing for per-session RNGs (golden ratio increment)
pub const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;
