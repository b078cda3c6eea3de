//! Hazard detection against trails and arena bounds
//!
//! Every live, locally simulated agent is tested against every trail
//! segment near it. A hit is a point-to-segment distance strictly below
//! `HIT_RADIUS`. An agent's own most recent `SELF_EXEMPT_SEGMENTS`
//! segments never hit it; older parts of its own trail do, with no killer.

use serde::{Deserialize, Serialize};

use crate::game::constants::collision::{GRID_CELL_SIZE, HIT_RADIUS, SELF_EXEMPT_SEGMENTS};
use crate::game::spatial::{SegmentGrid, SegmentRef};
use crate::game::state::{Agent, AgentId, Arena};
use crate::game::systems::trail::TrailSystem;

/// Why an agent was eliminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationCause {
    /// Hit another agent's trail
    Trail,
    /// Hit the non-exempt part of its own trail
    SelfTrail,
    /// Left the arena rectangle before the zone took over
    ArenaBounds,
    /// Outside the safe zone past the grace period
    Zone,
    /// Reported dead by authoritative sync
    Sync,
}

/// One elimination produced by a hazard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elimination {
    pub victim: AgentId,
    pub killer: Option<AgentId>,
    pub cause: EliminationCause,
}

/// Trail and bounds hazard checker; owns the reusable broad phase grid
#[derive(Debug)]
pub struct Collision {
    grid: SegmentGrid,
    hit_radius: f32,
    self_exempt_segments: usize,
}

impl Collision {
    pub fn new() -> Self {
        Self::with_params(HIT_RADIUS, SELF_EXEMPT_SEGMENTS)
    }

    pub fn with_params(hit_radius: f32, self_exempt_segments: usize) -> Self {
        Self {
            grid: SegmentGrid::new(GRID_CELL_SIZE, hit_radius),
            hit_radius,
            self_exempt_segments,
        }
    }

    /// Test every live agent against every trail.
    ///
    /// Remote agents are hazards through their trails but are never victims
    /// here; their liveness comes from authoritative sync. When several
    /// segments hit, the nearest one wins, ties going to the earlier
    /// registered owner, so attribution is deterministic.
    pub fn check(&mut self, agents: &[Agent], trails: &TrailSystem) -> Vec<Elimination> {
        self.rebuild_grid(agents, trails);
        if self.grid.is_empty() {
            return Vec::new();
        }

        let radius_sq = self.hit_radius * self.hit_radius;
        let mut eliminations = Vec::new();

        for (victim_idx, victim) in agents.iter().enumerate() {
            if victim.destroyed || victim.is_remote() {
                continue;
            }
            let own_segments = trails.polyline(victim.id).len().saturating_sub(1);

            let mut best: Option<(f32, &SegmentRef)> = None;
            for segment in self.grid.query_point(victim.position) {
                if segment.owner == victim_idx
                    && segment.index + self.self_exempt_segments >= own_segments
                {
                    continue;
                }
                let dist_sq = victim.position.distance_sq_to_segment(segment.a, segment.b);
                if dist_sq >= radius_sq {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_sq, best_seg)) => {
                        dist_sq < best_sq || (dist_sq == best_sq && segment.owner < best_seg.owner)
                    }
                };
                if better {
                    best = Some((dist_sq, segment));
                }
            }

            if let Some((_, segment)) = best {
                let (killer, cause) = if segment.owner == victim_idx {
                    (None, EliminationCause::SelfTrail)
                } else {
                    (Some(agents[segment.owner].id), EliminationCause::Trail)
                };
                eliminations.push(Elimination {
                    victim: victim.id,
                    killer,
                    cause,
                });
            }
        }

        eliminations
    }

    /// Rectangle test, used only while the zone is not yet constraining motion
    pub fn check_bounds(&self, agents: &[Agent], arena: &Arena) -> Vec<Elimination> {
        agents
            .iter()
            .filter(|a| !a.destroyed && !a.is_remote() && !arena.contains(a.position))
            .map(|a| Elimination {
                victim: a.id,
                killer: None,
                cause: EliminationCause::ArenaBounds,
            })
            .collect()
    }

    fn rebuild_grid(&mut self, agents: &[Agent], trails: &TrailSystem) {
        self.grid.clear();
        for (owner, agent) in agents.iter().enumerate() {
            if agent.destroyed {
                continue;
            }
            let points = trails.polyline(agent.id);
            for (index, pair) in points.windows(2).enumerate() {
                self.grid.insert(SegmentRef {
                    owner,
                    index,
                    a: pair[0].position,
                    b: pair[1].position,
                });
            }
        }
    }
}

impl Default for Collision {
    fn default() -> Self {
        Self::new()
    }
}
