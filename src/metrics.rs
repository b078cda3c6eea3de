//! Prometheus-compatible metrics endpoint
//!
//! Exposes simulation metrics in Prometheus format for the headless host.
//! Default endpoint: http://localhost:9090/metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::game::game_loop::{GameLoop, GameLoopEvent};
use crate::game::systems::collision::EliminationCause;

const TICK_HISTORY: usize = 1000;

/// Metrics registry for the simulation host
#[derive(Debug)]
pub struct Metrics {
    // Agent counts
    pub total_agents: AtomicU64,
    pub alive_agents: AtomicU64,

    // World
    pub trail_points: AtomicU64,
    pub zone_radius: AtomicU64,
    pub match_phase: AtomicU64, // 0=Waiting, 1=Active, 2=Finished

    // Tick timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_p99_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,
    pub tick_count: AtomicU64,

    // Events
    pub eliminations: AtomicU64,
    pub zone_eliminations: AtomicU64,
    pub boost_pad_triggers: AtomicU64,
    pub matches_finished: AtomicU64,

    #[cfg(feature = "metrics_extended")]
    pub trail_eliminations: AtomicU64,
    #[cfg(feature = "metrics_extended")]
    pub self_trail_eliminations: AtomicU64,
    #[cfg(feature = "metrics_extended")]
    pub bounds_eliminations: AtomicU64,
    #[cfg(feature = "metrics_extended")]
    pub sync_eliminations: AtomicU64,

    start_time: Instant,

    // Rolling tick times for percentile calculation
    tick_history: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_agents: AtomicU64::new(0),
            alive_agents: AtomicU64::new(0),
            trail_points: AtomicU64::new(0),
            zone_radius: AtomicU64::new(0),
            match_phase: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_p99_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            tick_count: AtomicU64::new(0),
            eliminations: AtomicU64::new(0),
            zone_eliminations: AtomicU64::new(0),
            boost_pad_triggers: AtomicU64::new(0),
            matches_finished: AtomicU64::new(0),
            #[cfg(feature = "metrics_extended")]
            trail_eliminations: AtomicU64::new(0),
            #[cfg(feature = "metrics_extended")]
            self_trail_eliminations: AtomicU64::new(0),
            #[cfg(feature = "metrics_extended")]
            bounds_eliminations: AtomicU64::new(0),
            #[cfg(feature = "metrics_extended")]
            sync_eliminations: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY)),
        }
    }

    /// Record a tick time and update percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.tick_count.fetch_add(1, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > TICK_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.tick_time_p95_us.store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_p99_us.store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_max_us.store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    /// Count discrete events from one tick
    pub fn record_events(&self, events: &[GameLoopEvent]) {
        for event in events {
            match event {
                GameLoopEvent::AgentEliminated { cause, .. } => {
                    self.eliminations.fetch_add(1, Ordering::Relaxed);
                    self.record_cause(*cause);
                }
                GameLoopEvent::ZoneEliminated { .. } => {
                    self.eliminations.fetch_add(1, Ordering::Relaxed);
                    self.zone_eliminations.fetch_add(1, Ordering::Relaxed);
                }
                GameLoopEvent::BoostPadTriggered { .. } => {
                    self.boost_pad_triggers.fetch_add(1, Ordering::Relaxed);
                }
                GameLoopEvent::MatchFinished { .. } => {
                    self.matches_finished.fetch_add(1, Ordering::Relaxed);
                }
                GameLoopEvent::MatchStarted { .. } | GameLoopEvent::ZoneFinalSurge { .. } => {}
            }
        }
    }

    #[cfg(feature = "metrics_extended")]
    fn record_cause(&self, cause: EliminationCause) {
        let counter = match cause {
            EliminationCause::Trail => &self.trail_eliminations,
            EliminationCause::SelfTrail => &self.self_trail_eliminations,
            EliminationCause::ArenaBounds => &self.bounds_eliminations,
            EliminationCause::Zone => &self.zone_eliminations,
            EliminationCause::Sync => &self.sync_eliminations,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[cfg(not(feature = "metrics_extended"))]
    fn record_cause(&self, _cause: EliminationCause) {}

    /// Refresh gauges from the current world
    pub fn observe(&self, game: &GameLoop) {
        let state = game.state();
        self.total_agents.store(state.agents.len() as u64, Ordering::Relaxed);
        self.alive_agents.store(state.alive_count() as u64, Ordering::Relaxed);
        self.trail_points.store(game.trails().point_count() as u64, Ordering::Relaxed);
        self.zone_radius.store(game.zone().current_radius().max(0.0) as u64, Ordering::Relaxed);
        self.match_phase.store(state.match_state.phase as u64, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("trail_royale_agents_total", "Registered agents", "gauge",
            self.total_agents.load(Ordering::Relaxed));
        metric!("trail_royale_agents_alive", "Agents still alive", "gauge",
            self.alive_agents.load(Ordering::Relaxed));
        metric!("trail_royale_trail_points", "Live trail points across all agents", "gauge",
            self.trail_points.load(Ordering::Relaxed));
        metric!("trail_royale_zone_radius", "Current safe zone radius in world units", "gauge",
            self.zone_radius.load(Ordering::Relaxed));
        metric!("trail_royale_match_phase", "Match phase (0=Waiting, 1=Active, 2=Finished)", "gauge",
            self.match_phase.load(Ordering::Relaxed));

        metric!("trail_royale_tick_time_microseconds", "Current tick time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        metric!("trail_royale_tick_time_p95_microseconds", "95th percentile tick time", "gauge",
            self.tick_time_p95_us.load(Ordering::Relaxed));
        metric!("trail_royale_tick_time_p99_microseconds", "99th percentile tick time", "gauge",
            self.tick_time_p99_us.load(Ordering::Relaxed));
        metric!("trail_royale_tick_time_max_microseconds", "Maximum tick time", "gauge",
            self.tick_time_max_us.load(Ordering::Relaxed));
        metric!("trail_royale_tick_count", "Total ticks processed", "counter",
            self.tick_count.load(Ordering::Relaxed));

        metric!("trail_royale_eliminations_total", "Total eliminations", "counter",
            self.eliminations.load(Ordering::Relaxed));
        metric!("trail_royale_zone_eliminations_total", "Eliminations by the zone", "counter",
            self.zone_eliminations.load(Ordering::Relaxed));
        metric!("trail_royale_boost_pad_triggers_total", "Boost pad activations", "counter",
            self.boost_pad_triggers.load(Ordering::Relaxed));
        metric!("trail_royale_matches_finished_total", "Matches finished", "counter",
            self.matches_finished.load(Ordering::Relaxed));

        #[cfg(feature = "metrics_extended")]
        {
            metric!("trail_royale_trail_eliminations_total", "Eliminations on another agent's trail", "counter",
                self.trail_eliminations.load(Ordering::Relaxed));
            metric!("trail_royale_self_trail_eliminations_total", "Eliminations on an agent's own trail", "counter",
                self.self_trail_eliminations.load(Ordering::Relaxed));
            metric!("trail_royale_bounds_eliminations_total", "Eliminations for leaving the arena", "counter",
                self.bounds_eliminations.load(Ordering::Relaxed));
            metric!("trail_royale_sync_eliminations_total", "Eliminations reported by authoritative sync", "counter",
                self.sync_eliminations.load(Ordering::Relaxed));
        }

        metric!("trail_royale_uptime_seconds", "Host uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// Generate JSON format metrics
    pub fn to_json(&self) -> String {
        let load = |v: &AtomicU64| v.load(Ordering::Relaxed);
        serde_json::json!({
            "agents": {
                "total": load(&self.total_agents),
                "alive": load(&self.alive_agents),
            },
            "world": {
                "trail_points": load(&self.trail_points),
                "zone_radius": load(&self.zone_radius),
                "match_phase": load(&self.match_phase),
            },
            "performance": {
                "tick_time_us": load(&self.tick_time_us),
                "tick_time_p95_us": load(&self.tick_time_p95_us),
                "tick_time_p99_us": load(&self.tick_time_p99_us),
                "tick_time_max_us": load(&self.tick_time_max_us),
                "tick_count": load(&self.tick_count),
            },
            "events": {
                "eliminations": load(&self.eliminations),
                "zone_eliminations": load(&self.zone_eliminations),
                "boost_pad_triggers": load(&self.boost_pad_triggers),
                "matches_finished": load(&self.matches_finished),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);

                    let response = if request.starts_with("GET /metrics/json") {
                        http_response("200 OK", "application/json", &metrics.to_json())
                    } else if request.starts_with("GET /metrics") {
                        http_response("200 OK", "text/plain; version=0.0.4", &metrics.to_prometheus())
                    } else if request.starts_with("GET /health") {
                        http_response("200 OK", "text/plain", "OK")
                    } else {
                        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
                    };

                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}
