//! Trail Royale Simulation Library
//!
//! Fixed-step, tick-driven core of an arena trail battle royale: agents
//! steer, boost and drift, leave hazardous trails, and fight a shrinking
//! zone until one is left. The core does no I/O; hosts feed intents and
//! authoritative sync through `game::input_buffer` and read
//! `net::protocol::WorldSnapshot`s back out.
//!
//! # Features
//!
//! - `metrics_extended` - Extra per-cause elimination counters in the Prometheus output

pub mod config;
pub mod util;
pub mod game;
pub mod net;
pub mod metrics;
