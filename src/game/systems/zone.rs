//! Shrinking circular safe zone
//!
//! The radius follows a linear schedule from start to end radius and is
//! smoothed toward it over clock time. Agents outside are pushed back toward
//! the centre and eliminated once they have stayed out longer than a grace
//! period that tightens as the match goes on.

use tracing::debug;

use crate::game::constants::zone as zc;
use crate::game::state::{Agent, AgentId, Arena, MatchMode};
use crate::util::clock::TimeMs;
use crate::util::vec2::{lerp, Vec2};

/// Events emitted by a zone tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneEvent {
    /// Agent stayed outside past the grace period
    Eliminated { agent: AgentId },
    /// Remaining shrink time dropped to the final surge threshold (once per match)
    FinalSurge { remaining_ms: u64 },
}

/// Safe zone state
#[derive(Debug, Clone)]
pub struct ZoneSystem {
    mode: MatchMode,
    center: Vec2,
    start_radius: f32,
    end_radius: f32,
    schedule_start: TimeMs,
    duration_ms: u64,
    current_radius: f32,
    target_radius: f32,
    progress: f32,
    tension: f32,
    last_tick: Option<TimeMs>,
    surge_fired: bool,
    configured: bool,
}

impl ZoneSystem {
    pub fn new(arena: &Arena, mode: MatchMode) -> Self {
        let start_radius = arena.width.min(arena.height) * zc::START_RADIUS_FRACTION;
        Self {
            mode,
            center: arena.center(),
            start_radius,
            end_radius: zc::END_RADIUS.min(start_radius),
            schedule_start: 0,
            duration_ms: 0,
            current_radius: start_radius,
            target_radius: start_radius,
            progress: 0.0,
            tension: 0.0,
            last_tick: None,
            surge_fired: false,
            configured: false,
        }
    }

    /// Compute the shrink schedule relative to `now` and reset the radius
    pub fn setup(&mut self, now: TimeMs) {
        let (delay, duration) = match self.mode {
            MatchMode::Casual => (
                zc::CASUAL_PRESTART_MS + zc::CASUAL_DELAY_MS,
                zc::CASUAL_DURATION_MS,
            ),
            MatchMode::Competitive => (zc::COMPETITIVE_DELAY_MS, zc::COMPETITIVE_DURATION_MS),
        };
        self.schedule_start = now + delay;
        self.duration_ms = duration;
        self.current_radius = self.start_radius;
        self.target_radius = self.start_radius;
        self.progress = 0.0;
        self.tension = 0.0;
        self.last_tick = Some(now);
        self.surge_fired = false;
        self.configured = true;
    }

    /// Advance the schedule and apply zone pressure.
    ///
    /// Calling twice with the same `now` leaves the radius unchanged the
    /// second time. Eliminations are reported, not applied; the caller owns
    /// agent destruction.
    pub fn tick(&mut self, dt: f32, agents: &mut [Agent], now: TimeMs) -> Vec<ZoneEvent> {
        let mut events = Vec::new();
        if !self.configured {
            return events;
        }

        self.advance_radius(now);

        let active = self.is_active(now);
        if active && !self.surge_fired {
            let remaining = self.remaining_ms(now);
            if remaining <= zc::FINAL_SURGE_REMAINING_MS {
                self.surge_fired = true;
                events.push(ZoneEvent::FinalSurge {
                    remaining_ms: remaining,
                });
            }
        }

        let grace = self.grace_secs();
        let push = (zc::KNOCKBACK_BASE + self.tension * zc::KNOCKBACK_TENSION) * dt.max(0.0);

        for agent in agents.iter_mut() {
            if agent.destroyed || agent.is_remote() {
                continue;
            }
            if !active {
                agent.out_zone_since = None;
                agent.out_zone_secs = 0.0;
                continue;
            }

            if self.contains(agent.position) {
                agent.out_zone_since = None;
                agent.out_zone_secs = 0.0;
                continue;
            }

            let offset = agent.position - self.center;
            let dist = offset.length();
            if dist > 0.0 {
                agent.knockback += -offset * (push / dist);
            }
            let since = *agent.out_zone_since.get_or_insert(now);
            agent.out_zone_secs = now.saturating_sub(since) as f32 / 1000.0;
            if agent.out_zone_secs > grace {
                debug!(
                    agent = %agent.id,
                    outside_secs = agent.out_zone_secs,
                    grace,
                    "zone grace expired"
                );
                events.push(ZoneEvent::Eliminated { agent: agent.id });
            }
        }

        events
    }

    fn advance_radius(&mut self, now: TimeMs) {
        self.progress = if now < self.schedule_start {
            0.0
        } else if self.duration_ms == 0 {
            1.0
        } else {
            ((now - self.schedule_start) as f32 / self.duration_ms as f32).min(1.0)
        };
        self.tension = self.progress.powf(zc::TENSION_EXPONENT);
        self.target_radius = lerp(self.start_radius, self.end_radius, self.progress);

        let elapsed_secs = match self.last_tick {
            Some(last) if now > last => (now - last) as f32 / 1000.0,
            _ => 0.0,
        };
        if elapsed_secs > 0.0 {
            let factor = 1.0 - (-zc::RADIUS_SMOOTHING * elapsed_secs).exp();
            let smoothed = self.current_radius + (self.target_radius - self.current_radius) * factor;
            // Single update site: never grows, never below the end radius
            self.current_radius = smoothed.min(self.current_radius).max(self.end_radius);
        }
        self.last_tick = Some(self.last_tick.map_or(now, |last| last.max(now)));
    }

    /// Whether the shrink schedule has started
    #[inline]
    pub fn is_active(&self, now: TimeMs) -> bool {
        self.configured && now >= self.schedule_start
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_to(self.center) <= self.current_radius
    }

    /// Grace period outside the zone at the current tension
    pub fn grace_secs(&self) -> f32 {
        (zc::GRACE_BASE_SECS - self.tension * zc::GRACE_TENSION_SECS).max(zc::GRACE_MIN_SECS)
    }

    pub fn remaining_ms(&self, now: TimeMs) -> u64 {
        (self.schedule_start + self.duration_ms).saturating_sub(now.max(self.schedule_start))
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn current_radius(&self) -> f32 {
        self.current_radius
    }

    pub fn target_radius(&self) -> f32 {
        self.target_radius
    }

    pub fn start_radius(&self) -> f32 {
        self.start_radius
    }

    pub fn end_radius(&self) -> f32 {
        self.end_radius
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn tension(&self) -> f32 {
        self.tension
    }

    pub fn schedule_start(&self) -> TimeMs {
        self.schedule_start
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::ControlKind;
    use uuid::Uuid;

    const TICK_MS: TimeMs = 16;
    const DT: f32 = 0.016;

    fn create_agent(x: f32) -> Agent {
        Agent::new(Uuid::new_v4(), "Test".to_string(), ControlKind::Bot, Vec2::new(x, 0.0), 0.0)
    }

    fn competitive_zone(now: TimeMs) -> ZoneSystem {
        let mut zone = ZoneSystem::new(&Arena::default(), MatchMode::Competitive);
        zone.setup(now);
        zone
    }

    #[test]
    fn test_setup_schedules() {
        let arena = Arena::default();
        let mut casual = ZoneSystem::new(&arena, MatchMode::Casual);
        casual.setup(1_000);
        assert_eq!(casual.schedule_start(), 1_000 + 10_000);
        assert_eq!(casual.duration_ms(), zc::CASUAL_DURATION_MS);
        assert_eq!(casual.current_radius(), casual.start_radius());
        assert!((casual.start_radius() - 6_000.0 * 0.48).abs() < 1e-3);

        let competitive = competitive_zone(1_000);
        assert_eq!(competitive.schedule_start(), 1_000);
        assert_eq!(competitive.duration_ms(), zc::COMPETITIVE_DURATION_MS);
    }

    #[test]
    fn test_contains_edge_is_inside() {
        let zone = competitive_zone(0);
        let r = zone.current_radius();
        assert!(zone.contains(zone.center()));
        assert!(zone.contains(Vec2::new(r, 0.0)));
        assert!(!zone.contains(Vec2::new(r + 1.0, 0.0)));

        // An agent sitting exactly on the edge accrues no outside time
        let mut zone = competitive_zone(0);
        let mut agents = vec![create_agent(r)];
        assert!(zone.tick(DT, &mut agents, 0).is_empty());
        assert_eq!(agents[0].out_zone_since, None);
        assert_eq!(agents[0].knockback, Vec2::ZERO);
    }

    #[test]
    fn test_radius_never_increases_and_never_below_end() {
        let mut zone = competitive_zone(0);
        let mut agents: Vec<Agent> = Vec::new();
        let mut last = zone.current_radius();
        let mut now = 0;
        while now < zc::COMPETITIVE_DURATION_MS + 5_000 {
            zone.tick(DT, &mut agents, now);
            assert!(zone.current_radius() <= last, "radius grew at {}", now);
            assert!(zone.current_radius() >= zone.end_radius());
            last = zone.current_radius();
            now += 100;
        }
        assert!((zone.current_radius() - zone.end_radius()).abs() < 1.0);
    }

    #[test]
    fn test_same_now_is_idempotent() {
        let mut zone = competitive_zone(0);
        let mut agents: Vec<Agent> = Vec::new();
        zone.tick(DT, &mut agents, 10_000);
        let first = zone.current_radius();
        zone.tick(DT, &mut agents, 10_000);
        assert_eq!(zone.current_radius(), first);
    }

    #[test]
    fn test_radius_smooths_rather_than_jumps() {
        let mut zone = competitive_zone(0);
        let mut agents: Vec<Agent> = Vec::new();
        zone.tick(DT, &mut agents, 1_000);
        // One second of smoothing closes most, but not all, of the gap
        assert!(zone.current_radius() < zone.start_radius());
        assert!(zone.current_radius() > zone.target_radius() + 1.0);
    }

    #[test]
    fn test_tension_curve() {
        let mut zone = competitive_zone(0);
        let mut agents: Vec<Agent> = Vec::new();
        zone.tick(DT, &mut agents, zc::COMPETITIVE_DURATION_MS / 2);
        assert!((zone.progress() - 0.5).abs() < 1e-4);
        assert!((zone.tension() - 0.5f32.powf(1.35)).abs() < 1e-4);
        assert!(zone.grace_secs() > 4.0 && zone.grace_secs() < 8.0);
    }

    #[test]
    fn test_eliminated_just_after_grace_at_full_tension() {
        let end = zc::COMPETITIVE_DURATION_MS;
        let mut zone = competitive_zone(0);
        let mut agents = vec![create_agent(zone.start_radius() + 200.0)];

        let mut now = end;
        let first_outside = now;
        loop {
            let events = zone.tick(DT, &mut agents, now);
            assert!((zone.tension() - 1.0).abs() < 1e-6);
            let grace_ms = (zone.grace_secs() * 1000.0) as u64;
            assert_eq!(grace_ms, 4_000);
            let eliminated = events
                .iter()
                .any(|e| matches!(e, ZoneEvent::Eliminated { agent } if *agent == agents[0].id));
            if now - first_outside <= grace_ms {
                assert!(!eliminated, "eliminated early at +{}ms", now - first_outside);
            } else {
                assert!(eliminated, "not eliminated at +{}ms", now - first_outside);
                assert!(now - first_outside <= grace_ms + TICK_MS);
                break;
            }
            // Keep the agent outside despite knockback
            agents[0].knockback = Vec2::ZERO;
            now += TICK_MS;
        }
    }

    #[test]
    fn test_inside_resets_outside_time() {
        let mut zone = competitive_zone(0);
        let mut agents = vec![create_agent(zone.start_radius() + 50.0)];
        zone.tick(DT, &mut agents, 100);
        zone.tick(DT, &mut agents, 1_100);
        assert!(agents[0].out_zone_secs > 0.9);
        assert!(agents[0].knockback.x < 0.0, "pushed toward centre");

        agents[0].position = Vec2::ZERO;
        zone.tick(DT, &mut agents, 1_116);
        assert_eq!(agents[0].out_zone_secs, 0.0);
        assert!(agents[0].out_zone_since.is_none());
    }

    #[test]
    fn test_no_pressure_before_schedule_start() {
        let arena = Arena::default();
        let mut zone = ZoneSystem::new(&arena, MatchMode::Casual);
        zone.setup(0);
        let mut agents = vec![create_agent(zone.start_radius() + 100.0)];
        let mut now = 0;
        while now < 9_900 {
            let events = zone.tick(DT, &mut agents, now);
            assert!(events.is_empty());
            now += 100;
        }
        assert_eq!(agents[0].out_zone_secs, 0.0);
        assert_eq!(agents[0].knockback, Vec2::ZERO);
    }

    #[test]
    fn test_final_surge_fires_once() {
        let mut zone = competitive_zone(0);
        let mut agents: Vec<Agent> = Vec::new();
        let mut surges = 0;
        let mut now = 0;
        while now <= zc::COMPETITIVE_DURATION_MS + 2_000 {
            surges += zone
                .tick(DT, &mut agents, now)
                .iter()
                .filter(|e| matches!(e, ZoneEvent::FinalSurge { .. }))
                .count();
            now += 250;
        }
        assert_eq!(surges, 1);
    }

    #[test]
    fn test_remote_agents_ignored() {
        let mut zone = competitive_zone(0);
        let mut remote = create_agent(zone.start_radius() + 500.0);
        remote.control = ControlKind::Remote;
        let mut agents = vec![remote];
        let mut now = 0;
        while now < 20_000 {
            assert!(zone.tick(DT, &mut agents, now).is_empty());
            now += 500;
        }
        assert_eq!(agents[0].out_zone_secs, 0.0);
    }

    #[test]
    fn test_unconfigured_zone_does_nothing() {
        let mut zone = ZoneSystem::new(&Arena::default(), MatchMode::Casual);
        let mut agents = vec![create_agent(99_999.0)];
        assert!(zone.tick(DT, &mut agents, 1_000_000).is_empty());
        assert!(!zone.is_active(1_000_000));
    }
}
