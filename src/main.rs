use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use trail_royale_sim::config::SimConfig;
use trail_royale_sim::game::game_loop::{GameLoop, GameLoopConfig, GameLoopEvent};
use trail_royale_sim::game::state::MatchPhase;
use trail_royale_sim::metrics::{self, Metrics};
use trail_royale_sim::util::clock::{Clock, MonotonicClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Trail Royale headless host v{}", env!("CARGO_PKG_VERSION"));

    let config = SimConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {:?} mode, {:?} arena, {} bots, {} Hz",
        config.match_mode, config.device_class, config.bot_count, config.tick_rate
    );

    let metrics = Arc::new(Metrics::new());
    let metrics_clone = metrics.clone();
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics::start_metrics_server(metrics_clone, metrics_port).await {
            error!("Metrics server error: {}", e);
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let clock = MonotonicClock::new();
    let mut game = GameLoop::new(GameLoopConfig::from(&config));
    game.fill_with_bots(config.bot_count);

    let interrupted = tokio::select! {
        _ = run_match(&mut game, &clock, &metrics, config.tick_interval_ms()) => false,
        _ = shutdown => true,
    };
    if interrupted {
        info!("Stopping match...");
        game.stop(clock.now_ms());
    }

    if let Some(result) = game.result() {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    info!("Host stopped");

    Ok(())
}

/// Drive one match to completion on a fixed interval
async fn run_match(game: &mut GameLoop, clock: &MonotonicClock, metrics: &Metrics, tick_ms: u64) {
    let mut ticker = interval(Duration::from_millis(tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    game.start_match(clock.now_ms());
    info!("Match loop started at {}ms per tick (seed {})", tick_ms, game.seed());

    while game.phase() != MatchPhase::Finished {
        ticker.tick().await;

        let started = Instant::now();
        let events = game.tick(clock.now_ms());
        metrics.record_tick_time(started.elapsed());
        metrics.record_events(&events);
        metrics.observe(game);

        for event in &events {
            match event {
                GameLoopEvent::AgentEliminated { victim, killer, cause } => {
                    debug!("Agent {} eliminated by {:?} ({:?})", victim, killer, cause);
                }
                GameLoopEvent::ZoneEliminated { agent } => {
                    debug!("Agent {} lost to the zone", agent);
                }
                GameLoopEvent::ZoneFinalSurge { remaining_ms } => {
                    info!("Final surge: {}s left", remaining_ms / 1000);
                }
                _ => {}
            }
        }

        if game.tick_count() % (1000 / tick_ms.max(1) * 10) == 0 {
            info!(
                "Tick {}: {} alive, zone radius {:.0}",
                game.tick_count(),
                game.state().alive_count(),
                game.zone().current_radius()
            );
        }
    }
}
