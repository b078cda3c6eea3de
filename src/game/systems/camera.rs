//! Chase camera for the locally controlled agent
//!
//! Zoom targets a device base value, pulled out by local crowd density and
//! overridden while boosting. Pan follows the agent with no lead. Shake is
//! a decaying oscillation with a little random jitter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::constants::camera as cc;
use crate::game::state::{Agent, Arena, DeviceClass};
use crate::util::vec2::Vec2;

/// Viewport transform handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransform {
    pub pan: Vec2,
    pub zoom: f32,
    pub shake_offset: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct DeviceTuning {
    base_zoom: f32,
    boost_zoom: f32,
    crowd_zoom_out: f32,
    zoom_blend: f32,
}

impl DeviceTuning {
    fn for_device(device: DeviceClass) -> Self {
        match device {
            DeviceClass::Desktop => Self {
                base_zoom: cc::DESKTOP_BASE_ZOOM,
                boost_zoom: cc::DESKTOP_BOOST_ZOOM,
                crowd_zoom_out: cc::DESKTOP_CROWD_ZOOM_OUT,
                zoom_blend: cc::DESKTOP_ZOOM_BLEND,
            },
            DeviceClass::Mobile => Self {
                base_zoom: cc::MOBILE_BASE_ZOOM,
                boost_zoom: cc::MOBILE_BOOST_ZOOM,
                crowd_zoom_out: cc::MOBILE_CROWD_ZOOM_OUT,
                zoom_blend: cc::MOBILE_ZOOM_BLEND,
            },
        }
    }
}

/// Dynamic viewport state; rebuilt on every match init
#[derive(Debug, Clone)]
pub struct CameraController {
    tuning: DeviceTuning,
    viewport: Vec2,
    arena: Arena,
    pan: Vec2,
    zoom: f32,
    target_zoom: f32,
    shake_intensity: f32,
    shake_phase: f32,
    shake_offset: Vec2,
    overview: bool,
    rng: StdRng,
}

impl CameraController {
    pub fn new(device: DeviceClass, viewport: Vec2, arena: Arena, seed: u64) -> Self {
        let tuning = DeviceTuning::for_device(device);
        Self {
            tuning,
            viewport,
            arena,
            pan: arena.center(),
            zoom: tuning.base_zoom,
            target_zoom: tuning.base_zoom,
            shake_intensity: 0.0,
            shake_phase: 0.0,
            shake_offset: Vec2::ZERO,
            overview: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pre-match overview: centre on the arena and fit it in the viewport
    pub fn set_overview(&mut self, overview: bool) {
        self.overview = overview;
    }

    pub fn is_overview(&self) -> bool {
        self.overview
    }

    /// Kick the shake; repeated impulses stack up to `SHAKE_MAX`
    pub fn add_shake(&mut self, impulse: f32) {
        self.shake_intensity =
            (self.shake_intensity + impulse * cc::SHAKE_IMPULSE_SCALE).min(cc::SHAKE_MAX);
    }

    /// Recompute the transform for this tick.
    ///
    /// `agents` may include `local`; it is skipped when counting the crowd.
    /// `clamp_to_arena` keeps the view inside the arena, and is ignored in
    /// overview.
    pub fn update(
        &mut self,
        local: Option<&Agent>,
        agents: &[Agent],
        dt: f32,
        clamp_to_arena: bool,
    ) -> CameraTransform {
        if self.overview {
            self.pan = self.arena.center();
            self.target_zoom = self.overview_zoom();
        } else if let Some(local) = local.filter(|a| a.is_alive()) {
            self.target_zoom = self.follow_zoom(local, agents);
            self.pan = local.position;
        }

        let blend = 1.0 - (1.0 - self.tuning.zoom_blend).powf(dt.max(0.0) * 60.0);
        self.zoom += (self.target_zoom - self.zoom) * blend;

        if clamp_to_arena && !self.overview {
            self.clamp_pan();
        }

        self.update_shake();
        self.transform()
    }

    fn follow_zoom(&self, local: &Agent, agents: &[Agent]) -> f32 {
        if local.is_boosting {
            return self.tuning.boost_zoom.clamp(cc::MIN_ZOOM, cc::MAX_ZOOM);
        }
        let radius_sq = cc::CROWD_RADIUS * cc::CROWD_RADIUS;
        let nearby = agents
            .iter()
            .filter(|a| a.id != local.id && a.is_alive())
            .filter(|a| a.position.distance_sq_to(local.position) <= radius_sq)
            .count();
        let crowd = (nearby as f32 / cc::CROWD_SATURATION).min(1.0);
        (self.tuning.base_zoom - crowd * self.tuning.crowd_zoom_out).clamp(cc::MIN_ZOOM, cc::MAX_ZOOM)
    }

    fn overview_zoom(&self) -> f32 {
        let fit_x = self.viewport.x / (self.arena.width + cc::OVERVIEW_PADDING);
        let fit_y = self.viewport.y / (self.arena.height + cc::OVERVIEW_PADDING);
        fit_x.min(fit_y).max(cc::OVERVIEW_MIN_ZOOM)
    }

    fn clamp_pan(&mut self) {
        let half_view_x = self.viewport.x * 0.5 / self.zoom;
        let half_view_y = self.viewport.y * 0.5 / self.zoom;
        let max_x = self.arena.half_width() - half_view_x;
        let max_y = self.arena.half_height() - half_view_y;
        // View wider than the arena: centre on that axis
        self.pan.x = if max_x > 0.0 { self.pan.x.clamp(-max_x, max_x) } else { 0.0 };
        self.pan.y = if max_y > 0.0 { self.pan.y.clamp(-max_y, max_y) } else { 0.0 };
    }

    fn update_shake(&mut self) {
        if self.shake_intensity <= 0.0 {
            self.shake_offset = Vec2::ZERO;
            return;
        }
        let intensity = self.shake_intensity;
        self.shake_phase += cc::SHAKE_FREQUENCY * cc::SHAKE_PHASE_STEP;
        let jitter_x = (self.rng.gen::<f32>() - 0.5) * intensity * cc::SHAKE_JITTER;
        let jitter_y = (self.rng.gen::<f32>() - 0.5) * intensity * cc::SHAKE_JITTER;
        self.shake_offset = Vec2::new(
            self.shake_phase.sin() * intensity * cc::SHAKE_OSCILLATION + jitter_x,
            (self.shake_phase * 1.3).cos() * intensity * cc::SHAKE_OSCILLATION + jitter_y,
        );

        self.shake_intensity *= cc::SHAKE_DECAY;
        if self.shake_intensity < cc::SHAKE_CUTOFF {
            self.shake_intensity = 0.0;
        }
    }

    pub fn transform(&self) -> CameraTransform {
        CameraTransform {
            pan: self.pan,
            zoom: self.zoom,
            shake_offset: self.shake_offset,
        }
    }

    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    pub fn shake_intensity(&self) -> f32 {
        self.shake_intensity
    }
}
