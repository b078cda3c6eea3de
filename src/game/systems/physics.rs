//! Per-agent kinematic integration
//!
//! Speed transition, heading interpolation, drift, the boost energy
//! economy, boost pad triggers and the turn-release burst. Every update is
//! a bounded per-tick delta: blend factors are capped at 1 and dt is
//! clamped to `MAX_DT`, so a long host stall can never teleport an agent.

use crate::game::constants::{agent, boost, boost_pad, buffs, burst, drift_charge, physics::MAX_DT};
use crate::game::state::{Agent, AgentId, BoostPad, Intent, Steering};
use crate::util::clock::TimeMs;
use crate::util::vec2::{normalize_angle, Vec2};

/// Discrete outcomes of one physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsEvent {
    BoostPadTriggered { agent: AgentId, pad: u32 },
}

/// Advance one agent by `dt` seconds.
///
/// No-op on a destroyed agent. At most one boost pad triggers per call.
pub fn advance(
    agent: &mut Agent,
    dt: f32,
    boost_pads: &mut [BoostPad],
    intent: &Intent,
    now: TimeMs,
) -> Option<PhysicsEvent> {
    if agent.destroyed {
        return None;
    }
    let dt = dt.clamp(0.0, MAX_DT);

    apply_intent(agent, intent, now);
    update_boost_energy(agent, dt);
    let pad_event = trigger_boost_pads(agent, boost_pads, now);

    // Speed
    let target = target_speed(agent, now);
    let blend = (agent.speed_transition_rate * dt).min(1.0);
    agent.speed += (target - agent.speed) * blend;

    // Heading
    let diff = normalize_angle(agent.target_angle - agent.angle);
    let turn = (agent.turn_responsiveness * dt).min(1.0);
    agent.angle = normalize_angle(agent.angle + diff * turn);

    update_drift(agent, dt);
    accumulate_drift_charge(agent, diff.abs(), dt);
    update_burst(agent, diff.abs(), now);
    integrate(agent, diff.abs(), dt, now);

    pad_event
}

/// Apply steering and the boost request.
///
/// Starting a boost needs `min_boost_energy + START_BUFFER`; releasing the
/// boost request stops boosting unless a pad-forced window is running.
pub fn apply_intent(agent: &mut Agent, intent: &Intent, now: TimeMs) {
    match intent.steering {
        Steering::Heading(angle) => agent.target_angle = normalize_angle(angle),
        Steering::TargetPoint(point) => {
            let to_target = point - agent.position;
            if to_target.length_sq() > 1e-6 {
                agent.target_angle = to_target.angle();
            }
        }
        Steering::Hold => {}
    }

    if intent.wants_boost {
        if !agent.is_boosting && can_start_boost(agent) {
            agent.is_boosting = true;
        }
    } else if now >= agent.forced_boost_until {
        agent.is_boosting = false;
    }
}

#[inline]
pub fn can_start_boost(agent: &Agent) -> bool {
    agent.boost_energy >= agent.min_boost_energy + boost::START_BUFFER
}

/// Drain while boosting, regenerate otherwise; energy stays in [0, max]
fn update_boost_energy(agent: &mut Agent, dt: f32) {
    if agent.is_boosting {
        agent.boost_energy -= agent.boost_consumption_rate * dt;
        if agent.boost_energy <= 0.0 {
            agent.is_boosting = false;
            agent.forced_boost_until = 0;
        }
    } else {
        agent.boost_energy += agent.boost_regen_rate * dt;
    }
    agent.boost_energy = agent.boost_energy.clamp(0.0, agent.max_boost_energy);
}

fn trigger_boost_pads(agent: &mut Agent, pads: &mut [BoostPad], now: TimeMs) -> Option<PhysicsEvent> {
    let pad = pads
        .iter_mut()
        .find(|pad| pad.is_ready(now) && pad.contains(agent.position))?;

    pad.last_triggered = Some(now);
    agent.boost_energy = (agent.boost_energy + boost_pad::ENERGY_GRANT).min(agent.max_boost_energy);
    agent.is_boosting = true;
    agent.forced_boost_until = now + boost_pad::FORCED_BOOST_MS;

    Some(PhysicsEvent::BoostPadTriggered {
        agent: agent.id,
        pad: pad.id,
    })
}

/// Speed the agent is blending toward this tick
pub fn target_speed(agent: &Agent, now: TimeMs) -> f32 {
    let hotspot = now < agent.hotspot_until;
    if agent.is_boosting {
        let mut target = agent.boost_speed;
        if hotspot {
            target *= buffs::HOTSPOT_BOOST_MULTIPLIER;
        }
        if now < agent.forced_boost_until {
            target *= boost_pad::SPEED_MULTIPLIER;
        }
        target
    } else {
        let mut target = agent.base_speed;
        if now < agent.kill_boost_until {
            target *= buffs::KILL_BOOST_MULTIPLIER;
        }
        if hotspot {
            target *= buffs::HOTSPOT_CRUISE_MULTIPLIER;
        }
        target
    }
}

fn update_drift(agent: &mut Agent, dt: f32) {
    agent.drift_factor = if agent.is_boosting {
        (agent.drift_factor + agent::DRIFT_BUILD_RATE * dt).min(agent.max_drift)
    } else {
        (agent.drift_factor - agent::DRIFT_DECAY_RATE * dt).max(0.0)
    };
}

/// Sustained hard turns build `drift_charge`.
///
/// Extension point: nothing consumes the charge yet.
fn accumulate_drift_charge(agent: &mut Agent, abs_diff: f32, dt: f32) {
    if abs_diff > drift_charge::HARD_TURN_THRESHOLD {
        agent.hard_turn_secs += dt;
        if agent.hard_turn_secs >= drift_charge::MIN_HARD_TURN_SECS {
            let rate = (abs_diff - drift_charge::HARD_TURN_THRESHOLD) * drift_charge::CHARGE_RATE;
            agent.drift_charge = (agent.drift_charge + rate * dt).min(drift_charge::MAX_CHARGE);
        }
    } else {
        agent.hard_turn_secs = 0.0;
    }
}

fn update_burst(agent: &mut Agent, abs_diff: f32, now: TimeMs) {
    let turning = abs_diff > burst::TURN_THRESHOLD;
    let bursting = now < agent.burst_until;
    if agent.was_turning && !turning && !bursting {
        agent.burst_until = now + burst::DURATION_MS;
    }
    agent.was_turning = turning;
}

fn integrate(agent: &mut Agent, abs_diff: f32, dt: f32, now: TimeMs) {
    let mut effective = agent.speed;
    if now < agent.burst_until {
        effective *= burst::MULTIPLIER;
    }

    let forward = agent.forward();
    let lateral = agent.drift_factor * effective * agent::DRIFT_LATERAL_SCALE * abs_diff;
    agent.velocity = forward * effective + forward.perpendicular() * lateral + agent.knockback;
    agent.position += agent.velocity * dt;

    agent.knockback *= agent::KNOCKBACK_DECAY_PER_SEC.powf(dt);
    if agent.knockback.length_sq() < 1e-4 {
        agent.knockback = Vec2::ZERO;
    }
}
