//! Simulation tuning constants, grouped by the system that reads them.
//!
//! Distances are world units, speeds are units/second, durations in
//! seconds are `f32` and clock durations in milliseconds are `u64`.

/// Integration limits
pub mod physics {
    /// Largest dt (seconds) a single tick may integrate; longer gaps are clamped
    pub const MAX_DT: f32 = 0.1;
    /// Default host tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds at the default rate
    pub const DT: f32 = 1.0 / 60.0;
}

/// Agent kinematics
pub mod agent {
    pub const BASE_SPEED: f32 = 220.0;
    pub const BOOST_SPEED: f32 = 850.0;

    /// Turn responsiveness for human-steered agents (per second)
    pub const HUMAN_TURN_RESPONSIVENESS: f32 = 10.0;
    pub const HUMAN_ACCELERATION: f32 = 24.0;
    pub const HUMAN_MAX_DRIFT: f32 = 0.7;

    pub const BOT_TURN_RESPONSIVENESS: f32 = 6.5;
    pub const BOT_ACCELERATION: f32 = 18.0;
    pub const BOT_MAX_DRIFT: f32 = 0.8;

    /// Drift factor ramp while boosting (per second)
    pub const DRIFT_BUILD_RATE: f32 = 2.0;
    /// Drift factor decay while cruising (per second)
    pub const DRIFT_DECAY_RATE: f32 = 1.5;
    /// Lateral drift velocity = drift * speed * DRIFT_LATERAL_SCALE * |diff|
    pub const DRIFT_LATERAL_SCALE: f32 = 0.4;

    /// Fraction of knockback velocity kept per second
    pub const KNOCKBACK_DECAY_PER_SEC: f32 = 0.02;
}

/// Boost energy economy
pub mod boost {
    pub const MAX_ENERGY: f32 = 100.0;
    pub const REGEN_RATE: f32 = 24.0;
    pub const CONSUMPTION_RATE: f32 = 55.0;
    pub const MIN_ENERGY: f32 = 20.0;
    /// Extra energy required above MIN_ENERGY to start a boost
    pub const START_BUFFER: f32 = 2.0;
}

/// Short-lived speed buffs
pub mod buffs {
    /// Boost target multiplier while a hotspot buff is active
    pub const HOTSPOT_BOOST_MULTIPLIER: f32 = 1.08;
    /// Cruise target multiplier while a hotspot buff is active
    pub const HOTSPOT_CRUISE_MULTIPLIER: f32 = 1.05;
    /// Cruise target multiplier after a credited kill
    pub const KILL_BOOST_MULTIPLIER: f32 = 1.1;
    pub const KILL_BOOST_DURATION_MS: u64 = 2_000;
}

/// Turn-release speed burst
pub mod burst {
    pub const MULTIPLIER: f32 = 1.3;
    pub const DURATION_MS: u64 = 600;
    /// |heading error| above which the agent counts as turning (radians)
    pub const TURN_THRESHOLD: f32 = 0.05;
}

/// Sustained hard-turn charge (accumulated, not yet consumed)
pub mod drift_charge {
    /// Heading error that counts as a hard turn (30 degrees)
    pub const HARD_TURN_THRESHOLD: f32 = std::f32::consts::PI / 6.0;
    /// Seconds of continuous hard turning before charge accumulates
    pub const MIN_HARD_TURN_SECS: f32 = 1.0;
    pub const CHARGE_RATE: f32 = 20.0;
    pub const MAX_CHARGE: f32 = 100.0;
}

/// Boost pads scattered across the arena
pub mod boost_pad {
    pub const DEFAULT_COUNT: usize = 10;
    pub const RADIUS: f32 = 30.0;
    pub const COOLDOWN_MS: u64 = 5_000;
    pub const ENERGY_GRANT: f32 = 20.0;
    /// Forced-boost window after a pad trigger
    pub const FORCED_BOOST_MS: u64 = 1_000;
    pub const SPEED_MULTIPLIER: f32 = 1.05;
    /// Pads keep this distance from the arena edge
    pub const EDGE_MARGIN: f32 = 200.0;
}

/// Hazard trail lifecycle
pub mod trail {
    pub const LIFETIME_MS: u64 = 8_000;
    /// Minimum travel since the last point before a new one is recorded
    pub const MIN_POINT_DISTANCE: f32 = 4.0;
}

/// Hazard detection
pub mod collision {
    /// Agent-to-segment distance strictly below this eliminates
    pub const HIT_RADIUS: f32 = 12.0;
    /// Most recent segments of an agent's own trail that cannot hit it
    pub const SELF_EXEMPT_SEGMENTS: usize = 5;
    /// Broad phase grid cell size
    pub const GRID_CELL_SIZE: f32 = 64.0;
}

/// Arena dimensions per device class
pub mod arena {
    pub const DESKTOP_WIDTH: f32 = 8_000.0;
    pub const DESKTOP_HEIGHT: f32 = 6_000.0;
    pub const MOBILE_WIDTH: f32 = 3_500.0;
    pub const MOBILE_HEIGHT: f32 = 7_700.0;
}

/// Shrinking safe zone
pub mod zone {
    /// Start radius as a fraction of min(arena width, height)
    pub const START_RADIUS_FRACTION: f32 = 0.48;
    pub const END_RADIUS: f32 = 400.0;

    pub const CASUAL_PRESTART_MS: u64 = 3_000;
    pub const CASUAL_DELAY_MS: u64 = 7_000;
    pub const CASUAL_DURATION_MS: u64 = 60_000;
    pub const COMPETITIVE_DELAY_MS: u64 = 0;
    pub const COMPETITIVE_DURATION_MS: u64 = 42_000;

    /// tension = progress ^ TENSION_EXPONENT
    pub const TENSION_EXPONENT: f32 = 1.35;
    /// Exponential smoothing rate of the current radius toward its target (per second)
    pub const RADIUS_SMOOTHING: f32 = 2.5;

    pub const KNOCKBACK_BASE: f32 = 20.0;
    pub const KNOCKBACK_TENSION: f32 = 50.0;
    pub const GRACE_BASE_SECS: f32 = 8.0;
    pub const GRACE_TENSION_SECS: f32 = 4.0;
    pub const GRACE_MIN_SECS: f32 = 4.0;

    /// Remaining shrink time at which the one-shot surge event fires
    pub const FINAL_SURGE_REMAINING_MS: u64 = 10_000;
}

/// Chase camera
pub mod camera {
    pub const DESKTOP_BASE_ZOOM: f32 = 0.75;
    pub const MOBILE_BASE_ZOOM: f32 = 0.55;
    pub const DESKTOP_BOOST_ZOOM: f32 = 0.85;
    pub const MOBILE_BOOST_ZOOM: f32 = 0.65;
    pub const DESKTOP_CROWD_ZOOM_OUT: f32 = 0.15;
    pub const MOBILE_CROWD_ZOOM_OUT: f32 = 0.05;
    /// Per-60Hz-frame zoom blend
    pub const DESKTOP_ZOOM_BLEND: f32 = 0.025;
    pub const MOBILE_ZOOM_BLEND: f32 = 0.03;

    pub const CROWD_RADIUS: f32 = 600.0;
    /// Agent count at which crowd zoom-out saturates
    pub const CROWD_SATURATION: f32 = 8.0;

    pub const MIN_ZOOM: f32 = 0.2;
    pub const MAX_ZOOM: f32 = 1.5;
    pub const OVERVIEW_MIN_ZOOM: f32 = 0.15;
    pub const OVERVIEW_PADDING: f32 = 400.0;

    pub const SHAKE_MAX: f32 = 15.0;
    pub const SHAKE_IMPULSE_SCALE: f32 = 4.0;
    pub const SHAKE_FREQUENCY: f32 = 30.0;
    pub const SHAKE_PHASE_STEP: f32 = 0.016;
    pub const SHAKE_DECAY: f32 = 0.85;
    pub const SHAKE_CUTOFF: f32 = 0.1;
    pub const SHAKE_OSCILLATION: f32 = 0.3;
    pub const SHAKE_JITTER: f32 = 0.4;
    pub const KILL_SHAKE: f32 = 0.6;
    pub const DEATH_SHAKE: f32 = 0.8;
}

/// Spawn placement
pub mod spawn {
    /// Inset of queued points from the arena edge
    pub const EDGE_MARGIN: f32 = 220.0;
    /// Inset for random fallback edge points
    pub const FALLBACK_MARGIN: f32 = 120.0;
    pub const HEADING_JITTER: f32 = 0.2;
    pub const FALLBACK_HEADING_JITTER: f32 = 0.3;
    /// Spawn points are pulled inside this fraction of the zone start radius
    pub const ZONE_CLAMP_FRACTION: f32 = 0.8;
    pub const MIN_SEPARATION: f32 = 300.0;
    pub const MAX_ATTEMPTS: usize = 30;
    /// Smaller rings tried for a crowded candidate before it is dropped
    pub const INNER_RINGS: usize = 3;
    /// Radial gap between rings; above MIN_SEPARATION so rings never conflict
    pub const RING_STEP: f32 = 320.0;
}

/// Bot steering policy
pub mod bot {
    pub const TURN_INTERVAL_MIN: f32 = 1.0;
    pub const TURN_INTERVAL_MAX: f32 = 3.0;
    /// Heading perturbation range (radians, centred on zero)
    pub const TURN_SPREAD: f32 = std::f32::consts::PI * 0.5;
    pub const BOOST_START_CHANCE: f64 = 0.3;
    pub const BOOST_STOP_CHANCE: f64 = 0.4;
    pub const BOOST_LOW_ENERGY: f32 = 10.0;
    pub const BOOST_HOLD_MIN: f32 = 2.0;
    pub const BOOST_HOLD_MAX: f32 = 5.0;
    pub const BOOST_REST_MIN: f32 = 1.0;
    pub const BOOST_REST_MAX: f32 = 3.0;
    pub const BOOST_RETRY: f32 = 0.5;
    /// Bots beyond this fraction of the zone radius steer home
    pub const ZONE_RETURN_FRACTION: f32 = 0.9;
}
