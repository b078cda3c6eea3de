//! Timer-driven bot steering
//!
//! Bots wander by nudging their target heading every few seconds and toggle
//! boosting on a random timer. A bot drifting toward the zone edge steers
//! back to the centre instead. The output is an ordinary `Intent`, so
//! Physics treats bots exactly like human-driven agents.

use rand::Rng;

use crate::game::constants::bot as bc;
use crate::game::state::{Agent, Intent, Steering};
use crate::game::systems::physics::can_start_boost;
use crate::util::vec2::Vec2;

/// Per-bot policy state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotBrain {
    pub turn_timer: f32,
    pub boost_timer: f32,
    pub wants_boost: bool,
}

impl BotBrain {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            turn_timer: rng.gen_range(bc::TURN_INTERVAL_MIN..bc::TURN_INTERVAL_MAX),
            boost_timer: rng.gen_range(bc::BOOST_RETRY..bc::BOOST_REST_MAX),
            wants_boost: false,
        }
    }
}

/// Produce this tick's intent for one bot
pub fn decide<R: Rng>(
    brain: &mut BotBrain,
    agent: &Agent,
    zone_center: Vec2,
    zone_radius: f32,
    dt: f32,
    rng: &mut R,
) -> Intent {
    let mut steering = Steering::Hold;

    brain.turn_timer -= dt;
    if brain.turn_timer <= 0.0 {
        let nudge = (rng.gen::<f32>() - 0.5) * bc::TURN_SPREAD;
        steering = Steering::Heading(agent.target_angle + nudge);
        brain.turn_timer = rng.gen_range(bc::TURN_INTERVAL_MIN..bc::TURN_INTERVAL_MAX);
    }

    if agent.position.distance_to(zone_center) > zone_radius * bc::ZONE_RETURN_FRACTION {
        steering = Steering::TargetPoint(zone_center);
    }

    brain.boost_timer -= dt;
    if brain.boost_timer <= 0.0 {
        if !brain.wants_boost && can_start_boost(agent) && rng.gen_bool(bc::BOOST_START_CHANCE) {
            brain.wants_boost = true;
            brain.boost_timer = rng.gen_range(bc::BOOST_HOLD_MIN..bc::BOOST_HOLD_MAX);
        } else if brain.wants_boost
            && (agent.boost_energy < bc::BOOST_LOW_ENERGY || rng.gen_bool(bc::BOOST_STOP_CHANCE))
        {
            brain.wants_boost = false;
            brain.boost_timer = rng.gen_range(bc::BOOST_REST_MIN..bc::BOOST_REST_MAX);
        } else {
            brain.boost_timer = bc::BOOST_RETRY;
        }
    }

    Intent {
        steering,
        wants_boost: brain.wants_boost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::ControlKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn create_bot(position: Vec2) -> Agent {
        Agent::new(Uuid::new_v4(), "Bot".to_string(), ControlKind::Bot, position, 0.0)
    }

    #[test]
    fn test_turn_timer_nudges_heading() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut brain = BotBrain::new(&mut rng);
        let bot = create_bot(Vec2::ZERO);
        brain.turn_timer = 0.01;
        let intent = decide(&mut brain, &bot, Vec2::ZERO, 2_000.0, 0.016, &mut rng);
        match intent.steering {
            Steering::Heading(angle) => {
                assert!((angle - bot.target_angle).abs() <= bc::TURN_SPREAD * 0.5);
            }
            other => panic!("expected heading nudge, got {:?}", other),
        }
        assert!(brain.turn_timer >= bc::TURN_INTERVAL_MIN);
    }

    #[test]
    fn test_holds_between_turns() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut brain = BotBrain::new(&mut rng);
        brain.turn_timer = 10.0;
        let bot = create_bot(Vec2::ZERO);
        let intent = decide(&mut brain, &bot, Vec2::ZERO, 2_000.0, 0.016, &mut rng);
        assert_eq!(intent.steering, Steering::Hold);
    }

    #[test]
    fn test_returns_to_zone_center() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut brain = BotBrain::new(&mut rng);
        let bot = create_bot(Vec2::new(1_950.0, 0.0));
        let intent = decide(&mut brain, &bot, Vec2::ZERO, 2_000.0, 0.016, &mut rng);
        assert_eq!(intent.steering, Steering::TargetPoint(Vec2::ZERO));
    }

    #[test]
    fn test_never_requests_boost_without_energy() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut brain = BotBrain::new(&mut rng);
        let mut bot = create_bot(Vec2::ZERO);
        bot.boost_energy = 5.0;
        for _ in 0..2_000 {
            let intent = decide(&mut brain, &bot, Vec2::ZERO, 2_000.0, 0.05, &mut rng);
            assert!(!intent.wants_boost);
        }
    }

    #[test]
    fn test_eventually_boosts_with_energy() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut brain = BotBrain::new(&mut rng);
        let bot = create_bot(Vec2::ZERO);
        let boosted = (0..2_000).any(|_| decide(&mut brain, &bot, Vec2::ZERO, 2_000.0, 0.05, &mut rng).wants_boost);
        assert!(boosted);
    }

    #[test]
    fn test_low_energy_stops_boost() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut brain = BotBrain::new(&mut rng);
        brain.wants_boost = true;
        brain.boost_timer = 0.0;
        let mut bot = create_bot(Vec2::ZERO);
        bot.boost_energy = bc::BOOST_LOW_ENERGY - 1.0;
        let intent = decide(&mut brain, &bot, Vec2::ZERO, 2_000.0, 0.016, &mut rng);
        assert!(!intent.wants_boost);
        assert!(brain.boost_timer >= bc::BOOST_REST_MIN);
    }
}
