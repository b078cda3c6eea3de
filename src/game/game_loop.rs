//! Match orchestrator
//!
//! Owns the agent list, the trail map and every per-tick component, and runs
//! them in a fixed order once per tick:
//! intent -> Physics -> TrailSystem -> Collision -> ZoneSystem -> Camera.
//! Also owns the `Waiting -> Active -> Finished` match state machine.

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::game::constants::{boost_pad, buffs, camera as cc, physics::MAX_DT};
use crate::game::input_buffer::{HostMessage, InputBuffer, InputSender};
use crate::game::match_result::{check_match_end, determine_result, MatchEndReason, MatchResult};
use crate::game::state::{
    Agent, AgentId, Arena, BoostPad, ControlKind, DeviceClass, GameState, Intent, MatchMode,
    MatchPhase,
};
use crate::game::systems::bot::{self, BotBrain};
use crate::game::systems::camera::{CameraController, CameraTransform};
use crate::game::systems::collision::{Collision, Elimination, EliminationCause};
use crate::game::systems::physics::{self, PhysicsEvent};
use crate::game::systems::spawn::SpawnManager;
use crate::game::systems::trail::TrailSystem;
use crate::game::systems::zone::{ZoneEvent, ZoneSystem};
use crate::net::protocol::{AuthoritativeAgent, SyncBatch, WorldSnapshot};
use crate::util::clock::TimeMs;
use crate::util::vec2::Vec2;

/// Game loop configuration
#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    pub mode: MatchMode,
    pub device: DeviceClass,
    pub boost_pads: usize,
    pub viewport: Vec2,
    /// RNG seed; random when absent
    pub seed: Option<u64>,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::Casual,
            device: DeviceClass::Desktop,
            boost_pads: boost_pad::DEFAULT_COUNT,
            viewport: Vec2::new(1280.0, 720.0),
            seed: None,
        }
    }
}

impl From<&SimConfig> for GameLoopConfig {
    fn from(config: &SimConfig) -> Self {
        Self {
            mode: config.match_mode,
            device: config.device_class,
            boost_pads: config.boost_pads,
            viewport: Vec2::new(config.viewport_width, config.viewport_height),
            seed: config.seed,
        }
    }
}

/// Events emitted by the game loop for collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameLoopEvent {
    MatchStarted { at: TimeMs, agents: usize },
    /// Trail, bounds or sync elimination; `killer` is None for self-inflicted ones
    AgentEliminated {
        victim: AgentId,
        killer: Option<AgentId>,
        cause: EliminationCause,
    },
    ZoneEliminated { agent: AgentId },
    ZoneFinalSurge { remaining_ms: u64 },
    BoostPadTriggered { agent: AgentId, pad: u32 },
    MatchFinished {
        winner: Option<AgentId>,
        reason: MatchEndReason,
    },
}

/// Main game loop
pub struct GameLoop {
    config: GameLoopConfig,
    seed: u64,
    state: GameState,
    trails: TrailSystem,
    collision: Collision,
    zone: ZoneSystem,
    camera: CameraController,
    camera_transform: CameraTransform,
    spawns: SpawnManager,
    bots: HashMap<AgentId, BotBrain>,
    /// Latest intent per human agent; persists until replaced
    intents: HashMap<AgentId, Intent>,
    local_agent: Option<AgentId>,
    input: InputBuffer,
    rng: StdRng,
    last_tick: Option<TimeMs>,
    tick_count: u64,
    bot_serial: u32,
    result: Option<MatchResult>,
}

impl GameLoop {
    pub fn new(config: GameLoopConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let arena = Arena::for_device(config.device);
        let zone = ZoneSystem::new(&arena, config.mode);
        let spawns = SpawnManager::new(arena, zone.center(), zone.start_radius());
        let mut camera = CameraController::new(config.device, config.viewport, arena, rng.gen());
        camera.set_overview(true);
        let camera_transform = camera.transform();

        Self {
            config,
            seed,
            state: GameState::new(arena),
            trails: TrailSystem::new(),
            collision: Collision::new(),
            zone,
            camera,
            camera_transform,
            spawns,
            bots: HashMap::new(),
            intents: HashMap::new(),
            local_agent: None,
            input: InputBuffer::default(),
            rng,
            last_tick: None,
            tick_count: 0,
            bot_serial: 0,
            result: None,
        }
    }

    /// Register an agent.
    ///
    /// While waiting the agent is placed at match start; during an active
    /// match it spawns immediately. Rejected once the match has finished or
    /// if the id is already taken.
    pub fn add_agent(&mut self, id: AgentId, name: String, control: ControlKind) -> bool {
        if self.state.match_state.phase == MatchPhase::Finished {
            warn!("Rejecting agent {} ({}): match finished", name, id);
            return false;
        }
        if self.state.get_agent(id).is_some() {
            return false;
        }

        let (position, angle) = if self.state.match_state.phase == MatchPhase::Active {
            let spawn = self.spawns.next_spawn(&mut self.rng);
            (spawn.position, spawn.angle)
        } else {
            (self.state.arena.center(), 0.0)
        };

        if control == ControlKind::Bot {
            self.bots.insert(id, BotBrain::new(&mut self.rng));
        }
        debug!("Adding {:?} agent {} ({})", control, name, id);
        self.state.add_agent(Agent::new(id, name, control, position, angle))
    }

    /// Register a bot with a generated id and name
    pub fn add_bot(&mut self) -> Option<AgentId> {
        self.bot_serial += 1;
        let id = Uuid::new_v4();
        let name = format!("Bot {}", self.bot_serial);
        self.add_agent(id, name, ControlKind::Bot).then_some(id)
    }

    pub fn fill_with_bots(&mut self, count: usize) -> usize {
        (0..count).filter_map(|_| self.add_bot()).count()
    }

    /// Agent the camera follows
    pub fn set_local_agent(&mut self, id: Option<AgentId>) {
        self.local_agent = id;
    }

    /// Store the intent for a human agent; it persists until replaced
    pub fn set_intent(&mut self, id: AgentId, intent: Intent) -> bool {
        match self.state.get_agent(id) {
            Some(agent) if agent.is_alive() && agent.control == ControlKind::Human => {
                self.intents.insert(id, intent);
                true
            }
            _ => false,
        }
    }

    /// Sender handle for intents and sync batches from other threads
    pub fn input_sender(&self) -> InputSender {
        self.input.sender()
    }

    /// Time-limited hotspot speed buff
    pub fn grant_hotspot_buff(&mut self, id: AgentId, duration_ms: u64, now: TimeMs) -> bool {
        match self.state.get_agent_mut(id) {
            Some(agent) if agent.is_alive() => {
                agent.hotspot_until = now.saturating_add(duration_ms);
                true
            }
            _ => false,
        }
    }

    /// Waiting -> Active: spawn every agent, place pads, start the zone schedule
    pub fn start_match(&mut self, now: TimeMs) -> Vec<GameLoopEvent> {
        if self.state.match_state.phase != MatchPhase::Waiting {
            warn!("start_match ignored in {:?}", self.state.match_state.phase);
            return Vec::new();
        }

        self.zone.setup(now);
        self.spawns.build_queue(self.state.agents.len(), &mut self.rng);
        for agent in self.state.agents.iter_mut() {
            let spawn = self.spawns.next_spawn(&mut self.rng);
            agent.position = spawn.position;
            agent.angle = spawn.angle;
            agent.target_angle = spawn.angle;
            agent.velocity = Vec2::ZERO;
        }
        self.place_boost_pads();
        self.trails.clear();

        self.state.match_state.phase = MatchPhase::Active;
        self.state.match_state.started_at = Some(now);
        self.last_tick = Some(now);
        self.camera.set_overview(false);

        let agents = self.state.agents.len();
        info!(
            "Match started: {} agents, {:?} mode, seed {}",
            agents, self.config.mode, self.seed
        );
        vec![GameLoopEvent::MatchStarted { at: now, agents }]
    }

    fn place_boost_pads(&mut self) {
        let hw = (self.state.arena.half_width() - boost_pad::EDGE_MARGIN).max(0.0);
        let hh = (self.state.arena.half_height() - boost_pad::EDGE_MARGIN).max(0.0);
        let rng = &mut self.rng;
        self.state.boost_pads = (0..self.config.boost_pads)
            .map(|i| {
                let position = Vec2::new(rng.gen_range(-hw..=hw), rng.gen_range(-hh..=hh));
                BoostPad::new(i as u32, position)
            })
            .collect();
    }

    /// Run a single tick at clock time `now`
    pub fn tick(&mut self, now: TimeMs) -> Vec<GameLoopEvent> {
        let mut events = Vec::new();
        self.process_input(now, &mut events);

        let dt = self
            .last_tick
            .map_or(0.0, |last| (now.saturating_sub(last) as f32 / 1000.0).min(MAX_DT));
        self.last_tick = Some(now);
        self.tick_count += 1;

        if self.state.match_state.phase != MatchPhase::Active {
            self.update_camera(dt);
            return events;
        }

        // 1. Intents
        let zone_center = self.zone.center();
        let zone_radius = self.zone.current_radius();
        let mut intents = Vec::with_capacity(self.state.agents.len());
        for agent in &self.state.agents {
            let intent = match agent.control {
                ControlKind::Bot if agent.is_alive() => match self.bots.get_mut(&agent.id) {
                    Some(brain) => bot::decide(brain, agent, zone_center, zone_radius, dt, &mut self.rng),
                    None => Intent::default(),
                },
                ControlKind::Human => self.intents.get(&agent.id).copied().unwrap_or_default(),
                _ => Intent::default(),
            };
            intents.push(intent);
        }

        // 2. Physics
        for (agent, intent) in self.state.agents.iter_mut().zip(&intents) {
            if agent.is_remote() {
                continue;
            }
            if let Some(PhysicsEvent::BoostPadTriggered { agent, pad }) =
                physics::advance(agent, dt, &mut self.state.boost_pads, intent, now)
            {
                events.push(GameLoopEvent::BoostPadTriggered { agent, pad });
            }
        }

        // 3. Trails
        for agent in &self.state.agents {
            self.trails.record(agent, now);
        }
        self.trails.tick(now);

        // 4. Collision
        let mut eliminations = self.collision.check(&self.state.agents, &self.trails);
        if !self.zone.is_active(now) {
            eliminations.extend(self.collision.check_bounds(&self.state.agents, &self.state.arena));
        }
        for elimination in eliminations {
            self.eliminate(elimination, now, &mut events);
        }

        // 5. Zone
        for event in self.zone.tick(dt, &mut self.state.agents, now) {
            match event {
                ZoneEvent::Eliminated { agent } => self.eliminate(
                    Elimination {
                        victim: agent,
                        killer: None,
                        cause: EliminationCause::Zone,
                    },
                    now,
                    &mut events,
                ),
                ZoneEvent::FinalSurge { remaining_ms } => {
                    info!("Zone final surge: {}ms remaining", remaining_ms);
                    events.push(GameLoopEvent::ZoneFinalSurge { remaining_ms });
                }
            }
        }

        // 6. Camera
        self.update_camera(dt);

        if let Some(reason) = check_match_end(&self.state) {
            self.finish(reason, now, &mut events);
        }

        trace!(
            tick = self.tick_count,
            alive = self.state.alive_count(),
            trail_points = self.trails.point_count(),
            zone_radius = self.zone.current_radius(),
            "tick"
        );
        events
    }

    fn process_input(&mut self, now: TimeMs, events: &mut Vec<GameLoopEvent>) {
        for message in self.input.drain() {
            match message {
                HostMessage::Intent { agent, intent } => {
                    if !self.set_intent(agent, intent) {
                        debug!("Dropping intent for agent {}", agent);
                    }
                }
                HostMessage::Sync(batch) => events.extend(self.apply_sync(&batch, now)),
            }
        }
    }

    /// Apply trusted state from the authoritative channel.
    ///
    /// Positions override remote agents only. `is_alive == false` eliminates
    /// any agent. Unknown or already destroyed ids are ignored. Batches are
    /// ignored outside an active match.
    pub fn apply_sync(&mut self, batch: &SyncBatch, now: TimeMs) -> Vec<GameLoopEvent> {
        let mut events = Vec::new();
        if self.state.match_state.phase != MatchPhase::Active {
            debug!("Ignoring sync batch outside an active match");
            return events;
        }

        for &AuthoritativeAgent { id, is_alive, position } in &batch.agents {
            let Some(agent) = self.state.get_agent_mut(id) else {
                debug!("Ignoring sync for unknown agent {}", id);
                continue;
            };
            if agent.destroyed {
                debug!("Ignoring sync for destroyed agent {}", id);
                continue;
            }
            if agent.is_remote() {
                agent.position = position;
                agent.velocity = Vec2::ZERO;
            }
            if !is_alive {
                self.eliminate(
                    Elimination {
                        victim: id,
                        killer: None,
                        cause: EliminationCause::Sync,
                    },
                    now,
                    &mut events,
                );
            }
        }
        events
    }

    /// Destroy the victim once, drop its trail, credit the killer
    fn eliminate(&mut self, elimination: Elimination, now: TimeMs, events: &mut Vec<GameLoopEvent>) {
        let Elimination { victim, killer, cause } = elimination;
        let Some(agent) = self.state.get_agent_mut(victim) else {
            return;
        };
        if !agent.destroy(now) {
            return;
        }
        self.trails.remove(victim);
        self.intents.remove(&victim);
        self.bots.remove(&victim);

        let killer = killer.filter(|&k| k != victim);
        if let Some(killer_id) = killer {
            if let Some(k) = self.state.get_agent_mut(killer_id) {
                k.kills += 1;
                k.kill_boost_until = now + buffs::KILL_BOOST_DURATION_MS;
            }
        }

        if self.local_agent == Some(victim) {
            self.camera.add_shake(cc::DEATH_SHAKE);
        } else if killer.is_some() && killer == self.local_agent {
            self.camera.add_shake(cc::KILL_SHAKE);
        }

        debug!("Agent {} eliminated by {:?} ({:?})", victim, killer, cause);
        events.push(match cause {
            EliminationCause::Zone => GameLoopEvent::ZoneEliminated { agent: victim },
            _ => GameLoopEvent::AgentEliminated { victim, killer, cause },
        });
    }

    fn update_camera(&mut self, dt: f32) {
        let local = self.local_agent.and_then(|id| self.state.get_agent(id));
        let clamp = self.state.match_state.phase == MatchPhase::Active;
        self.camera_transform = self.camera.update(local, &self.state.agents, dt, clamp);
    }

    fn finish(&mut self, reason: MatchEndReason, now: TimeMs, events: &mut Vec<GameLoopEvent>) {
        let result = determine_result(&self.state, reason, now);
        let winner = result.winner_id;

        let match_state = &mut self.state.match_state;
        match_state.phase = MatchPhase::Finished;
        match_state.finished_at = Some(now);
        match_state.winner = winner;

        info!(
            "Match finished: {:?}, winner {:?}, {} kills in {}ms",
            reason, result.winner_name, result.total_kills, result.duration_ms
        );
        self.result = Some(result);
        events.push(GameLoopEvent::MatchFinished { winner, reason });
    }

    /// External stop; finishes the match with no winner
    pub fn stop(&mut self, now: TimeMs) -> Vec<GameLoopEvent> {
        let mut events = Vec::new();
        if self.state.match_state.phase != MatchPhase::Finished {
            self.finish(MatchEndReason::Stopped, now, &mut events);
        }
        events
    }

    /// Rebuild every component from scratch, keeping the roster.
    ///
    /// Only valid between ticks. Agents come back fresh with the same ids,
    /// names and control kinds; the match returns to `Waiting`.
    pub fn reset(&mut self) {
        let roster: Vec<(AgentId, String, ControlKind)> = self
            .state
            .agents
            .iter()
            .map(|a| (a.id, a.name.clone(), a.control))
            .collect();

        let arena = Arena::for_device(self.config.device);
        self.state = GameState::new(arena);
        self.trails = TrailSystem::new();
        self.collision = Collision::new();
        self.zone = ZoneSystem::new(&arena, self.config.mode);
        self.spawns = SpawnManager::new(arena, self.zone.center(), self.zone.start_radius());
        self.camera = CameraController::new(self.config.device, self.config.viewport, arena, self.rng.gen());
        self.camera.set_overview(true);
        self.camera_transform = self.camera.transform();
        self.bots.clear();
        self.intents.clear();
        self.input.drain();
        self.last_tick = None;
        self.tick_count = 0;
        self.result = None;

        for (id, name, control) in roster {
            self.add_agent(id, name, control);
        }
        info!("Match reset with {} agents", self.state.agents.len());
    }

    /// Read-only view for the renderer
    pub fn snapshot(&self, now: TimeMs) -> WorldSnapshot {
        WorldSnapshot::capture(
            &self.state,
            &self.trails,
            &self.zone,
            self.camera_transform,
            self.tick_count,
            now,
        )
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn trails(&self) -> &TrailSystem {
        &self.trails
    }

    pub fn zone(&self) -> &ZoneSystem {
        &self.zone
    }

    pub fn camera_transform(&self) -> CameraTransform {
        self.camera_transform
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.match_state.phase
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn local_agent(&self) -> Option<AgentId> {
        self.local_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{boost, physics::TICK_RATE, spawn as sc};
    use crate::util::clock::{Clock, ManualClock};
    use std::f32::consts::PI;

    const STEP_MS: TimeMs = 1_000 / TICK_RATE as TimeMs;

    fn test_config(mode: MatchMode, pads: usize) -> GameLoopConfig {
        GameLoopConfig {
            mode,
            boost_pads: pads,
            seed: Some(1234),
            ..Default::default()
        }
    }

    fn add_human(game: &mut GameLoop, name: &str) -> AgentId {
        let id = Uuid::new_v4();
        assert!(game.add_agent(id, name.to_string(), ControlKind::Human));
        id
    }

    fn place(game: &mut GameLoop, id: AgentId, position: Vec2, angle: f32) {
        let agent = game.state_mut().get_agent_mut(id).unwrap();
        agent.position = position;
        agent.angle = angle;
        agent.target_angle = angle;
    }

    fn dead(id: AgentId) -> AuthoritativeAgent {
        AuthoritativeAgent {
            id,
            is_alive: false,
            position: Vec2::ZERO,
        }
    }

    #[test]
    fn test_start_match_spawns_all_agents() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 10));
        assert_eq!(game.fill_with_bots(6), 6);
        assert_eq!(game.phase(), MatchPhase::Waiting);

        let events = game.start_match(1_000);
        assert_eq!(events, vec![GameLoopEvent::MatchStarted { at: 1_000, agents: 6 }]);
        assert_eq!(game.phase(), MatchPhase::Active);
        assert_eq!(game.state().boost_pads.len(), 10);

        let max_radius = game.zone().start_radius() * sc::ZONE_CLAMP_FRACTION;
        let agents = &game.state().agents;
        for (i, a) in agents.iter().enumerate() {
            assert!(a.position.length() <= max_radius + 1e-2, "agent {} spawned outside zone", i);
            assert_eq!(a.velocity, Vec2::ZERO);
            assert_eq!(a.boost_energy, boost::MAX_ENERGY);
            for b in agents.iter().skip(i + 1) {
                assert!(a.position.distance_to(b.position) >= sc::MIN_SEPARATION);
            }
        }
    }

    #[test]
    fn test_spawn_round_trip_zero_ticks() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        game.fill_with_bots(3);
        game.start_match(0);
        let issued: Vec<Vec2> = game.spawns.issued().to_vec();
        for (agent, spawn) in game.state().agents.iter().zip(&issued) {
            assert_eq!(agent.position, *spawn);
            assert_eq!(agent.velocity, Vec2::ZERO);
        }
    }

    #[test]
    fn test_straight_run_toward_stationary_agent() {
        const TICKS: usize = 60;

        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let still = Uuid::new_v4();
        assert!(game.add_agent(still, "still".into(), ControlKind::Remote));
        let mover = add_human(&mut game, "mover");
        game.start_match(0);

        let start = Vec2::new(-1_000.0, 0.0);
        place(&mut game, still, Vec2::ZERO, 0.0);
        place(&mut game, mover, start, 0.0);
        assert!(game.set_intent(mover, Intent::heading(0.0, false)));

        let clock = ManualClock::new(0);
        let mut last_dist = start.length();
        let mut last_points = 0;
        for _ in 0..TICKS {
            let events = game.tick(clock.advance(STEP_MS));
            assert!(events.is_empty(), "unexpected events {:?}", events);

            let agent = game.state().get_agent(mover).unwrap();
            assert!(!agent.is_boosting);
            let dist = agent.position.length();
            assert!(dist < last_dist, "distance to centre must shrink every tick");
            last_dist = dist;

            let points = game.trails().polyline(mover).len();
            assert!(points >= last_points);
            last_points = points;
        }

        let agent = game.state().get_agent(mover).unwrap();
        let expected = agent.base_speed * (clock.now_ms() as f32 / 1_000.0);
        let travelled = agent.position.distance_to(start);
        assert!(
            (travelled - expected).abs() < 0.5,
            "travelled {} expected {}",
            travelled,
            expected
        );

        // One step is shorter than the point spacing, two steps are longer
        assert_eq!(game.trails().polyline(mover).len(), (TICKS + 1) / 2);
        assert_eq!(game.trails().polyline(still).len(), 1);
        assert_eq!(game.state().get_agent(still).unwrap().position, Vec2::ZERO);
        assert_eq!(game.state().alive_count(), 2);
        assert_eq!(game.phase(), MatchPhase::Active);
    }

    #[test]
    fn test_waiting_tick_does_not_integrate() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let id = add_human(&mut game, "A");
        let before = game.state().get_agent(id).unwrap().position;
        let clock = ManualClock::new(0);
        for _ in 0..30 {
            assert!(game.tick(clock.advance(STEP_MS)).is_empty());
        }
        assert_eq!(game.state().get_agent(id).unwrap().position, before);
        assert_eq!(game.trails().trail_count(), 0);
        assert_eq!(game.camera_transform().pan, Vec2::ZERO, "overview centres on the arena");
    }

    #[test]
    fn test_duplicate_and_finished_rejections() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let id = add_human(&mut game, "A");
        assert!(!game.add_agent(id, "again".into(), ControlKind::Human));

        game.start_match(0);
        game.stop(100);
        assert_eq!(game.phase(), MatchPhase::Finished);
        assert!(!game.add_agent(Uuid::new_v4(), "late".into(), ControlKind::Human));
        assert!(game.add_bot().is_none());
    }

    #[test]
    fn test_late_joiner_spawns_immediately() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        game.fill_with_bots(2);
        game.start_match(0);
        game.tick(STEP_MS);

        let id = add_human(&mut game, "late");
        let agent = game.state().get_agent(id).unwrap();
        assert_eq!(game.spawns.issued().len(), 3);
        assert_eq!(agent.position, game.spawns.issued()[2]);
        assert!(agent.is_alive());
    }

    #[test]
    fn test_human_intent_persists() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let a = add_human(&mut game, "A");
        add_human(&mut game, "B");
        game.start_match(0);
        place(&mut game, a, Vec2::ZERO, 0.0);

        game.input_sender().send_intent(a, Intent::heading(PI / 2.0, false)).unwrap();
        let clock = ManualClock::new(0);
        for _ in 0..60 {
            game.tick(clock.advance(STEP_MS));
        }
        let agent = game.state().get_agent(a).unwrap();
        assert!((agent.angle - PI / 2.0).abs() < 0.01, "heading {}", agent.angle);
        assert!(agent.position.y > 100.0);
    }

    #[test]
    fn test_trail_kill_attribution() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let a = add_human(&mut game, "A");
        let b = add_human(&mut game, "B");
        let c = add_human(&mut game, "C");
        game.start_match(0);

        // B crosses the origin heading +y, A reaches it later heading +x
        place(&mut game, b, Vec2::new(0.0, -300.0), PI / 2.0);
        place(&mut game, a, Vec2::new(-400.0, 0.0), 0.0);
        place(&mut game, c, Vec2::new(2_000.0, 2_000.0), 0.0);

        let clock = ManualClock::new(0);
        let mut found = None;
        for _ in 0..200 {
            for event in game.tick(clock.advance(STEP_MS)) {
                if let GameLoopEvent::AgentEliminated { .. } = event {
                    found = Some(event);
                }
            }
            if found.is_some() {
                break;
            }
        }

        assert_eq!(
            found,
            Some(GameLoopEvent::AgentEliminated {
                victim: a,
                killer: Some(b),
                cause: EliminationCause::Trail,
            })
        );
        let killer = game.state().get_agent(b).unwrap();
        assert_eq!(killer.kills, 1);
        assert!(killer.kill_boost_until > 0);
        assert_eq!(game.phase(), MatchPhase::Active, "two agents remain");
    }

    #[test]
    fn test_destroyed_agent_is_frozen_and_trail_removed() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let a = add_human(&mut game, "A");
        add_human(&mut game, "B");
        add_human(&mut game, "C");
        game.start_match(0);
        let clock = ManualClock::new(0);
        for _ in 0..10 {
            game.tick(clock.advance(STEP_MS));
        }
        assert!(game.trails().contains(a));

        let events = game.apply_sync(&SyncBatch { agents: vec![dead(a)] }, clock.now_ms());
        assert_eq!(
            events,
            vec![GameLoopEvent::AgentEliminated {
                victim: a,
                killer: None,
                cause: EliminationCause::Sync,
            }]
        );
        assert!(!game.trails().contains(a));

        let frozen = game.state().get_agent(a).unwrap().position;
        for _ in 0..30 {
            let events = game.tick(clock.advance(STEP_MS));
            assert!(events.iter().all(|e| !matches!(e, GameLoopEvent::AgentEliminated { victim, .. } if *victim == a)));
        }
        assert_eq!(game.state().get_agent(a).unwrap().position, frozen);
        assert!(!game.trails().contains(a));

        // A second report does not double count
        assert!(game.apply_sync(&SyncBatch { agents: vec![dead(a)] }, clock.advance(STEP_MS)).is_empty());
    }

    #[test]
    fn test_sync_overrides_remote_position_only() {
        let mut game = GameLoop::new(test_config(MatchMode::Competitive, 0));
        let remote = Uuid::new_v4();
        assert!(game.add_agent(remote, "R".into(), ControlKind::Remote));
        let human = add_human(&mut game, "H");
        game.start_match(0);
        let human_before = game.state().get_agent(human).unwrap().position;

        let target = Vec2::new(100.0, 100.0);
        let batch = SyncBatch {
            agents: vec![
                AuthoritativeAgent { id: remote, is_alive: true, position: target },
                AuthoritativeAgent { id: human, is_alive: true, position: target },
                AuthoritativeAgent { id: Uuid::new_v4(), is_alive: false, position: target },
            ],
        };
        game.input_sender().send_sync(batch).unwrap();
        let events = game.tick(STEP_MS);
        assert!(events.is_empty());

        assert_eq!(game.state().get_agent(remote).unwrap().position, target, "remote is not integrated");
        let human_after = game.state().get_agent(human).unwrap().position;
        assert_ne!(human_after, target);
        assert!(human_after.distance_to(human_before) < 10.0);
    }

    #[test]
    fn test_last_agent_standing() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let a = add_human(&mut game, "A");
        let b = add_human(&mut game, "B");
        game.start_match(0);

        game.input_sender().send_sync(SyncBatch { agents: vec![dead(a)] }).unwrap();
        let events = game.tick(STEP_MS);
        assert_eq!(
            events.last(),
            Some(&GameLoopEvent::MatchFinished {
                winner: Some(b),
                reason: MatchEndReason::LastAgentStanding,
            })
        );
        assert_eq!(game.phase(), MatchPhase::Finished);
        assert_eq!(game.state().match_state.winner, Some(b));
        let result = game.result().unwrap();
        assert_eq!(result.winner_id, Some(b));
        assert_eq!(result.rankings[0].agent_id, b);

        // Finished is terminal
        assert!(game.tick(2 * STEP_MS).is_empty());
        assert!(game.start_match(3 * STEP_MS).is_empty());
    }

    #[test]
    fn test_zero_survivors_has_no_winner() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let a = add_human(&mut game, "A");
        let b = add_human(&mut game, "B");
        game.start_match(0);

        game.input_sender()
            .send_sync(SyncBatch { agents: vec![dead(a), dead(b)] })
            .unwrap();
        let events = game.tick(STEP_MS);
        assert_eq!(
            events.last(),
            Some(&GameLoopEvent::MatchFinished {
                winner: None,
                reason: MatchEndReason::NoSurvivors,
            })
        );
        assert!(game.result().unwrap().winner_id.is_none());
    }

    #[test]
    fn test_stop_then_reset_keeps_roster() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 4));
        let a = add_human(&mut game, "A");
        let bot = game.add_bot().unwrap();
        game.set_local_agent(Some(a));
        game.start_match(0);
        let clock = ManualClock::new(0);
        for _ in 0..20 {
            game.tick(clock.advance(STEP_MS));
        }

        let events = game.stop(clock.advance(STEP_MS));
        assert_eq!(
            events,
            vec![GameLoopEvent::MatchFinished {
                winner: None,
                reason: MatchEndReason::Stopped,
            }]
        );
        assert!(game.stop(clock.advance(STEP_MS)).is_empty());

        game.reset();
        assert_eq!(game.phase(), MatchPhase::Waiting);
        assert_eq!(game.tick_count(), 0);
        assert!(game.result().is_none());
        assert_eq!(game.trails().trail_count(), 0);
        assert!(game.state().boost_pads.is_empty());
        let ids: Vec<AgentId> = game.state().agents.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![a, bot]);
        assert!(game.state().agents.iter().all(|a| a.is_alive() && a.kills == 0));
        assert_eq!(game.state().get_agent(bot).unwrap().control, ControlKind::Bot);
        assert_eq!(game.local_agent(), Some(a));

        assert_eq!(game.start_match(clock.advance(STEP_MS)).len(), 1);
    }

    #[test]
    fn test_bot_match_invariants() {
        let mut game = GameLoop::new(test_config(MatchMode::Competitive, 10));
        game.fill_with_bots(8);
        game.start_match(0);

        let clock = ManualClock::new(0);
        let mut last_radius = game.zone().current_radius();
        let mut finished = false;
        for _ in 0..7_500 {
            let events = game.tick(clock.advance(STEP_MS));
            for agent in &game.state().agents {
                assert!(
                    (0.0..=agent.max_boost_energy).contains(&agent.boost_energy),
                    "energy {} out of range",
                    agent.boost_energy
                );
                if agent.destroyed {
                    assert!(!game.trails().contains(agent.id));
                }
            }
            let radius = game.zone().current_radius();
            assert!(radius <= last_radius + 1e-3, "zone grew from {} to {}", last_radius, radius);
            last_radius = radius;

            if events.iter().any(|e| matches!(e, GameLoopEvent::MatchFinished { .. })) {
                finished = true;
                break;
            }
        }
        assert!(finished, "competitive zone forces a result within two minutes");
        assert!(game.state().alive_count() <= 1);
    }

    #[test]
    fn test_hotspot_buff() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 0));
        let a = add_human(&mut game, "A");
        assert!(game.grant_hotspot_buff(a, 5_000, 100));
        assert_eq!(game.state().get_agent(a).unwrap().hotspot_until, 5_100);
        assert!(!game.grant_hotspot_buff(Uuid::new_v4(), 5_000, 100));

        // Saturates instead of wrapping near the end of the clock range
        assert!(game.grant_hotspot_buff(a, 5_000, TimeMs::MAX - 10));
        assert_eq!(game.state().get_agent(a).unwrap().hotspot_until, TimeMs::MAX);
    }

    #[test]
    fn test_snapshot_tracks_tick() {
        let mut game = GameLoop::new(test_config(MatchMode::Casual, 2));
        game.fill_with_bots(3);
        game.start_match(0);
        let clock = ManualClock::new(0);
        for _ in 0..5 {
            game.tick(clock.advance(STEP_MS));
        }
        let snapshot = game.snapshot(clock.now_ms());
        assert_eq!(snapshot.tick, 5);
        assert_eq!(snapshot.phase, MatchPhase::Active);
        assert_eq!(snapshot.agents.len(), 3);
        assert_eq!(snapshot.boost_pads.len(), 2);
        assert!(!snapshot.zone.active, "casual zone waits before shrinking");
    }
}
