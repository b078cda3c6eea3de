//! Hazard trail lifecycle
//!
//! Each live agent leaves an ordered polyline of timestamped points. Points
//! share one global lifetime, so expiry order equals insertion order and
//! expired points always come off the front.

use hashbrown::HashMap;

use crate::game::constants::trail::{LIFETIME_MS, MIN_POINT_DISTANCE};
use crate::game::state::{Agent, AgentId, TrailPoint};
use crate::util::clock::TimeMs;

/// Owns every agent's trail
#[derive(Debug, Clone)]
pub struct TrailSystem {
    trails: HashMap<AgentId, Vec<TrailPoint>>,
    lifetime_ms: u64,
    min_point_distance: f32,
}

impl TrailSystem {
    pub fn new() -> Self {
        Self::with_params(LIFETIME_MS, MIN_POINT_DISTANCE)
    }

    pub fn with_params(lifetime_ms: u64, min_point_distance: f32) -> Self {
        Self {
            trails: HashMap::new(),
            lifetime_ms,
            min_point_distance,
        }
    }

    #[inline]
    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    /// Append the agent's current position if it moved far enough since the
    /// last recorded point. The trail is created lazily on the first point.
    ///
    /// Returns true if a point was appended.
    pub fn record(&mut self, agent: &Agent, now: TimeMs) -> bool {
        if agent.destroyed {
            return false;
        }

        let trail = self.trails.entry(agent.id).or_default();
        if let Some(last) = trail.last() {
            if now < last.created_at {
                return false;
            }
            let min_sq = self.min_point_distance * self.min_point_distance;
            if last.position.distance_sq_to(agent.position) < min_sq {
                return false;
            }
        }

        trail.push(TrailPoint {
            position: agent.position,
            created_at: now,
            boosting: agent.is_boosting,
            expires_at: now + self.lifetime_ms,
        });
        true
    }

    /// Drop expired points and any trail left empty.
    ///
    /// Returns the number of points removed.
    pub fn tick(&mut self, now: TimeMs) -> usize {
        let mut removed = 0;
        self.trails.retain(|_, points| {
            let expired = points.partition_point(|p| p.expires_at <= now);
            if expired > 0 {
                points.drain(..expired);
                removed += expired;
            }
            !points.is_empty()
        });
        removed
    }

    /// Ordered points of one agent's trail, oldest first
    pub fn polyline(&self, id: AgentId) -> &[TrailPoint] {
        self.trails.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Discard an agent's trail (on elimination)
    pub fn remove(&mut self, id: AgentId) -> Option<Vec<TrailPoint>> {
        self.trails.remove(&id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.trails.contains_key(&id)
    }

    pub fn trail_count(&self) -> usize {
        self.trails.len()
    }

    pub fn point_count(&self) -> usize {
        self.trails.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.trails.clear();
    }

    /// Remaining life of a point in [0, 1]
    pub fn life_fraction(&self, point: &TrailPoint, now: TimeMs) -> f32 {
        if self.lifetime_ms == 0 {
            return 0.0;
        }
        let remaining = point.expires_at.saturating_sub(now);
        (remaining as f32 / self.lifetime_ms as f32).clamp(0.0, 1.0)
    }
}

impl Default for TrailSystem {
    fn default() -> Self {
        Self::new()
    }
}
