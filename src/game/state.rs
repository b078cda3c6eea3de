//! Simulation state definitions
//!
//! Contains the agents, boost pads, arena bounds and match lifecycle state
//! owned by the game loop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::constants::{agent, arena, boost, boost_pad};
use crate::util::clock::TimeMs;
use crate::util::vec2::Vec2;

/// Unique agent identifier
pub type AgentId = Uuid;

/// Who produces an agent's intent each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlKind {
    /// Locally steered by host input
    Human,
    /// Steered by the built-in bot policy
    Bot,
    /// Driven by authoritative sync; never integrated locally
    Remote,
}

/// Steering half of an intent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Steering {
    /// Absolute desired heading in radians
    Heading(f32),
    /// World point to steer toward
    TargetPoint(Vec2),
    /// Keep the current target heading
    Hold,
}

/// One tick of control input for one agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub steering: Steering,
    pub wants_boost: bool,
}

impl Intent {
    pub fn heading(angle: f32, wants_boost: bool) -> Self {
        Self {
            steering: Steering::Heading(angle),
            wants_boost,
        }
    }

    pub fn toward(target: Vec2, wants_boost: bool) -> Self {
        Self {
            steering: Steering::TargetPoint(target),
            wants_boost,
        }
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            steering: Steering::Hold,
            wants_boost: false,
        }
    }
}

/// One participant in the arena
///
/// Fields are grouped the way systems touch them: kinematics every tick,
/// boost economy and timers in Physics, zone bookkeeping in ZoneSystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub control: ControlKind,

    // === Kinematics ===
    pub position: Vec2,
    pub velocity: Vec2,
    /// Externally applied push (zone), decays each tick
    pub knockback: Vec2,
    pub angle: f32,
    pub target_angle: f32,
    pub speed: f32,
    pub base_speed: f32,
    pub boost_speed: f32,
    pub speed_transition_rate: f32,
    pub turn_responsiveness: f32,
    pub drift_factor: f32,
    pub max_drift: f32,

    // === Boost economy ===
    pub boost_energy: f32,
    pub max_boost_energy: f32,
    pub boost_regen_rate: f32,
    pub boost_consumption_rate: f32,
    pub min_boost_energy: f32,
    pub is_boosting: bool,

    // === Timers (clock ms) ===
    pub burst_until: TimeMs,
    pub was_turning: bool,
    /// Pad-forced boost; the intent cannot cancel it before this time
    pub forced_boost_until: TimeMs,
    pub hotspot_until: TimeMs,
    pub kill_boost_until: TimeMs,

    // === Drift charge ===
    pub drift_charge: f32,
    pub hard_turn_secs: f32,

    // === Zone ===
    /// Seconds spent continuously outside the safe zone
    pub out_zone_secs: f32,
    pub out_zone_since: Option<TimeMs>,

    // === Scoring ===
    pub kills: u32,
    pub destroyed: bool,
    pub eliminated_at: Option<TimeMs>,
}

impl Agent {
    /// Create an agent at rest with full boost energy and zero drift
    pub fn new(id: AgentId, name: String, control: ControlKind, position: Vec2, angle: f32) -> Self {
        let (turn, accel, drift_cap) = match control {
            ControlKind::Bot => (
                agent::BOT_TURN_RESPONSIVENESS,
                agent::BOT_ACCELERATION,
                agent::BOT_MAX_DRIFT,
            ),
            ControlKind::Human | ControlKind::Remote => (
                agent::HUMAN_TURN_RESPONSIVENESS,
                agent::HUMAN_ACCELERATION,
                agent::HUMAN_MAX_DRIFT,
            ),
        };

        Self {
            id,
            name,
            control,
            position,
            velocity: Vec2::ZERO,
            knockback: Vec2::ZERO,
            angle,
            target_angle: angle,
            speed: agent::BASE_SPEED,
            base_speed: agent::BASE_SPEED,
            boost_speed: agent::BOOST_SPEED,
            speed_transition_rate: accel,
            turn_responsiveness: turn,
            drift_factor: 0.0,
            max_drift: drift_cap,
            boost_energy: boost::MAX_ENERGY,
            max_boost_energy: boost::MAX_ENERGY,
            boost_regen_rate: boost::REGEN_RATE,
            boost_consumption_rate: boost::CONSUMPTION_RATE,
            min_boost_energy: boost::MIN_ENERGY,
            is_boosting: false,
            burst_until: 0,
            was_turning: false,
            forced_boost_until: 0,
            hotspot_until: 0,
            kill_boost_until: 0,
            drift_charge: 0.0,
            hard_turn_secs: 0.0,
            out_zone_secs: 0.0,
            out_zone_since: None,
            kills: 0,
            destroyed: false,
            eliminated_at: None,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.destroyed
    }

    #[inline]
    pub fn is_remote(&self) -> bool {
        self.control == ControlKind::Remote
    }

    /// Unit vector along the current heading
    #[inline]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Mark destroyed. Returns false if the agent was already destroyed,
    /// so callers can never count the same elimination twice.
    pub fn destroy(&mut self, now: TimeMs) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        self.is_boosting = false;
        self.velocity = Vec2::ZERO;
        self.knockback = Vec2::ZERO;
        self.eliminated_at = Some(now);
        true
    }
}

/// Circular pad that tops up energy and forces a boost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostPad {
    pub id: u32,
    pub position: Vec2,
    pub radius: f32,
    pub cooldown_ms: u64,
    pub last_triggered: Option<TimeMs>,
}

impl BoostPad {
    pub fn new(id: u32, position: Vec2) -> Self {
        Self {
            id,
            position,
            radius: boost_pad::RADIUS,
            cooldown_ms: boost_pad::COOLDOWN_MS,
            last_triggered: None,
        }
    }

    #[inline]
    pub fn is_ready(&self, now: TimeMs) -> bool {
        match self.last_triggered {
            Some(at) => now >= at + self.cooldown_ms,
            None => true,
        }
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_sq_to(self.position) <= self.radius * self.radius
    }
}

/// One recorded point of a hazard trail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub position: Vec2,
    pub created_at: TimeMs,
    pub boosting: bool,
    pub expires_at: TimeMs,
}

/// Display class; selects arena dimensions and camera tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceClass {
    #[default]
    Desktop,
    /// Small or portrait display
    Mobile,
}

/// Zone schedule tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    #[default]
    Casual,
    Competitive,
}

/// Axis-aligned arena centred on the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn for_device(device: DeviceClass) -> Self {
        match device {
            DeviceClass::Desktop => Self {
                width: arena::DESKTOP_WIDTH,
                height: arena::DESKTOP_HEIGHT,
            },
            DeviceClass::Mobile => Self {
                width: arena::MOBILE_WIDTH,
                height: arena::MOBILE_HEIGHT,
            },
        }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::ZERO
    }

    /// Inclusive bounds test
    pub fn contains(&self, point: Vec2) -> bool {
        point.x.abs() <= self.half_width() && point.y.abs() <= self.half_height()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::for_device(DeviceClass::Desktop)
    }
}

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Pre-match, spawns pending
    #[default]
    Waiting,
    Active,
    Finished,
}

/// Match lifecycle bookkeeping
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub phase: MatchPhase,
    pub started_at: Option<TimeMs>,
    pub finished_at: Option<TimeMs>,
    pub winner: Option<AgentId>,
}

/// Everything the game loop owns apart from component state
#[derive(Debug, Clone, Default)]
pub struct GameState {
    /// Registration order is the deterministic iteration order
    pub agents: Vec<Agent>,
    pub boost_pads: Vec<BoostPad>,
    pub arena: Arena,
    pub match_state: MatchState,
}

impl GameState {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            ..Default::default()
        }
    }

    pub fn get_agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn get_agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn alive_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_agents().count()
    }

    /// Add an agent; a duplicate id is rejected
    pub fn add_agent(&mut self, agent: Agent) -> bool {
        if self.get_agent(agent.id).is_some() {
            return false;
        }
        self.agents.push(agent);
        true
    }
}
