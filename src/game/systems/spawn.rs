//! Spawn placement around the arena perimeter
//!
//! A shuffled queue of edge points is built at match start. Each issued
//! point is pulled inside the zone's start radius and must keep
//! `MIN_SEPARATION` from every point issued before it. A crowded candidate
//! is stepped inward onto up to `INNER_RINGS` smaller rings before it is
//! dropped; once the queue is empty, random edge points take its place.

use std::collections::VecDeque;
use std::f32::consts::PI;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::game::constants::spawn as sc;
use crate::game::state::Arena;
use crate::util::vec2::Vec2;

/// Start position and heading for one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub position: Vec2,
    pub angle: f32,
}

#[derive(Debug, Clone)]
pub struct SpawnManager {
    arena: Arena,
    zone_center: Vec2,
    zone_start_radius: f32,
    queue: VecDeque<SpawnPoint>,
    issued: Vec<Vec2>,
    min_separation: f32,
    /// Spawns issued without meeting `min_separation`
    fallbacks: usize,
}

impl SpawnManager {
    pub fn new(arena: Arena, zone_center: Vec2, zone_start_radius: f32) -> Self {
        Self {
            arena,
            zone_center,
            zone_start_radius,
            queue: VecDeque::new(),
            issued: Vec::new(),
            min_separation: sc::MIN_SEPARATION,
            fallbacks: 0,
        }
    }

    /// Build a shuffled queue of `count` edge points facing the interior.
    /// Forgets previously issued points.
    pub fn build_queue<R: Rng>(&mut self, count: usize, rng: &mut R) {
        self.queue.clear();
        self.issued.clear();
        self.fallbacks = 0;
        if count == 0 {
            return;
        }

        let per_side = count.div_ceil(4);
        let left = -self.arena.half_width() + sc::EDGE_MARGIN;
        let right = self.arena.half_width() - sc::EDGE_MARGIN;
        let top = -self.arena.half_height() + sc::EDGE_MARGIN;
        let bottom = self.arena.half_height() - sc::EDGE_MARGIN;
        let step_y = (bottom - top) / per_side as f32;
        let step_x = (right - left) / per_side as f32;

        let mut points = Vec::with_capacity(count);
        let sides: [(f32, bool); 4] = [(0.0, true), (PI, true), (PI / 2.0, false), (-PI / 2.0, false)];
        for (side, &(facing, vertical)) in sides.iter().enumerate() {
            for i in 0..per_side {
                if points.len() >= count {
                    break;
                }
                let along = i as f32 + 0.5;
                let position = if vertical {
                    let x = if side == 0 { left } else { right };
                    Vec2::new(x, (top + along * step_y).clamp(top, bottom))
                } else {
                    let y = if side == 2 { top } else { bottom };
                    Vec2::new((left + along * step_x).clamp(left, right), y)
                };
                let jitter = (rng.gen::<f32>() - 0.5) * 2.0 * sc::HEADING_JITTER;
                points.push(SpawnPoint {
                    position,
                    angle: facing + jitter,
                });
            }
        }

        points.shuffle(rng);
        self.queue.extend(points);
    }

    /// Next spawn point, separated from everything issued so far when possible
    pub fn next_spawn<R: Rng>(&mut self, rng: &mut R) -> SpawnPoint {
        let mut best: Option<(f32, SpawnPoint)> = None;

        for _ in 0..sc::MAX_ATTEMPTS {
            let raw = match self.queue.pop_front() {
                Some(point) => point,
                None => self.random_edge_spawn(rng),
            };
            let clamped = self.clamp_to_zone(raw);
            for ring in 0..=sc::INNER_RINGS {
                let candidate = self.pull_inward(clamped, ring as f32 * sc::RING_STEP);
                let clearance = self.clearance(candidate.position);
                if clearance >= self.min_separation {
                    self.issued.push(candidate.position);
                    return candidate;
                }
                if best.map_or(true, |(c, _)| clearance > c) {
                    best = Some((clearance, candidate));
                }
            }
        }

        let (clearance, chosen) =
            best.unwrap_or_else(|| (0.0, self.clamp_to_zone(self.random_edge_spawn(rng))));
        warn!(
            clearance,
            required = self.min_separation,
            "spawn separation not met, using best candidate"
        );
        self.fallbacks += 1;
        self.issued.push(chosen.position);
        chosen
    }

    /// Random point on a random arena edge, facing inward
    pub fn random_edge_spawn<R: Rng>(&self, rng: &mut R) -> SpawnPoint {
        let hw = self.arena.half_width() - sc::FALLBACK_MARGIN;
        let hh = self.arena.half_height() - sc::FALLBACK_MARGIN;
        let jitter = (rng.gen::<f32>() - 0.5) * 2.0 * sc::FALLBACK_HEADING_JITTER;
        let (position, facing) = match rng.gen_range(0..4) {
            0 => (Vec2::new(-hw, rng.gen_range(-hh..=hh)), 0.0),
            1 => (Vec2::new(hw, rng.gen_range(-hh..=hh)), PI),
            2 => (Vec2::new(rng.gen_range(-hw..=hw), -hh), PI / 2.0),
            _ => (Vec2::new(rng.gen_range(-hw..=hw), hh), -PI / 2.0),
        };
        SpawnPoint {
            position,
            angle: facing + jitter,
        }
    }

    /// Pull a point radially inside `ZONE_CLAMP_FRACTION` of the zone start radius
    pub fn clamp_to_zone(&self, spawn: SpawnPoint) -> SpawnPoint {
        let max_radius = self.zone_start_radius * sc::ZONE_CLAMP_FRACTION;
        let offset = spawn.position - self.zone_center;
        SpawnPoint {
            position: self.zone_center + offset.clamp_length(max_radius),
            angle: spawn.angle,
        }
    }

    /// Move a point `inset` units toward the zone centre along its radius
    fn pull_inward(&self, spawn: SpawnPoint, inset: f32) -> SpawnPoint {
        let offset = spawn.position - self.zone_center;
        let len = offset.length();
        if inset <= 0.0 || len <= f32::EPSILON {
            return spawn;
        }
        let scale = (len - inset).max(0.0) / len;
        SpawnPoint {
            position: self.zone_center + offset * scale,
            angle: spawn.angle,
        }
    }

    fn clearance(&self, position: Vec2) -> f32 {
        self.issued
            .iter()
            .map(|p| p.distance_to(position))
            .fold(f32::INFINITY, f32::min)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn issued(&self) -> &[Vec2] {
        &self.issued
    }

    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }
}
