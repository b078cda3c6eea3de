//! Renderer and authoritative-sync boundary types
//!
//! The core never draws and never talks to a transport. After each tick it
//! exposes a `WorldSnapshot`; an external channel may feed `SyncBatch`es of
//! trusted agent state back in. Both encode with bincode.

use serde::{Deserialize, Serialize};

use crate::game::state::{Agent, AgentId, BoostPad, GameState, MatchPhase};
use crate::game::systems::camera::CameraTransform;
use crate::game::systems::trail::TrailSystem;
use crate::game::systems::zone::ZoneSystem;
use crate::util::clock::TimeMs;
use crate::util::vec2::Vec2;

/// Per-agent pose for drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    pub id: AgentId,
    pub name: String,
    pub position: Vec2,
    pub angle: f32,
    pub is_boosting: bool,
    pub destroyed: bool,
    pub boost_energy: f32,
    pub kills: u32,
}

impl AgentPose {
    pub fn from_agent(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name.clone(),
            position: agent.position,
            angle: agent.angle,
            is_boosting: agent.is_boosting,
            destroyed: agent.destroyed,
            boost_energy: agent.boost_energy,
            kills: agent.kills,
        }
    }
}

/// One trail point with its remaining life in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPointSnapshot {
    pub position: Vec2,
    pub boosting: bool,
    pub life: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailSnapshot {
    pub agent: AgentId,
    pub points: Vec<TrailPointSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub center: Vec2,
    pub current_radius: f32,
    pub target_radius: f32,
    pub active: bool,
    pub remaining_ms: u64,
}

impl ZoneSnapshot {
    pub fn from_zone(zone: &ZoneSystem, now: TimeMs) -> Self {
        Self {
            center: zone.center(),
            current_radius: zone.current_radius(),
            target_radius: zone.target_radius(),
            active: zone.is_active(now),
            remaining_ms: zone.remaining_ms(now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostPadSnapshot {
    pub id: u32,
    pub position: Vec2,
    pub radius: f32,
    pub ready: bool,
}

impl BoostPadSnapshot {
    pub fn from_pad(pad: &BoostPad, now: TimeMs) -> Self {
        Self {
            id: pad.id,
            position: pad.position,
            radius: pad.radius,
            ready: pad.is_ready(now),
        }
    }
}

/// Read-only view of the world after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub time: TimeMs,
    pub phase: MatchPhase,
    pub agents: Vec<AgentPose>,
    /// Trails of live agents, in agent registration order
    pub trails: Vec<TrailSnapshot>,
    pub zone: ZoneSnapshot,
    pub boost_pads: Vec<BoostPadSnapshot>,
    pub camera: CameraTransform,
}

impl WorldSnapshot {
    pub fn capture(
        state: &GameState,
        trails: &TrailSystem,
        zone: &ZoneSystem,
        camera: CameraTransform,
        tick: u64,
        now: TimeMs,
    ) -> Self {
        let trail_snapshots = state
            .alive_agents()
            .filter_map(|agent| {
                let points = trails.polyline(agent.id);
                if points.is_empty() {
                    return None;
                }
                Some(TrailSnapshot {
                    agent: agent.id,
                    points: points
                        .iter()
                        .map(|p| TrailPointSnapshot {
                            position: p.position,
                            boosting: p.boosting,
                            life: trails.life_fraction(p, now),
                        })
                        .collect(),
                })
            })
            .collect();

        Self {
            tick,
            time: now,
            phase: state.match_state.phase,
            agents: state.agents.iter().map(AgentPose::from_agent).collect(),
            trails: trail_snapshots,
            zone: ZoneSnapshot::from_zone(zone, now),
            boost_pads: state
                .boost_pads
                .iter()
                .map(|pad| BoostPadSnapshot::from_pad(pad, now))
                .collect(),
            camera,
        }
    }
}

/// Trusted state for one remotely controlled agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeAgent {
    pub id: AgentId,
    pub is_alive: bool,
    pub position: Vec2,
}

/// One delivery from the authoritative channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncBatch {
    pub agents: Vec<AuthoritativeAgent>,
}

/// Encode a boundary message using bincode
/// Uses legacy config for fixed-size integers
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decode a boundary message using bincode
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Decode error: {0}")]
    Decode(String),
}
