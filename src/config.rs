use crate::game::constants::{boost_pad, physics};
use crate::game::state::{DeviceClass, MatchMode};

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Zone schedule tuning
    pub match_mode: MatchMode,
    /// Arena shape and camera zoom
    pub device_class: DeviceClass,
    /// Bots added to a headless match
    pub bot_count: usize,
    /// Boost pads placed at match start
    pub boost_pads: usize,
    /// Host tick rate in Hz
    pub tick_rate: u32,
    /// RNG seed; random when absent
    pub seed: Option<u64>,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Prometheus endpoint port (binary only)
    pub metrics_port: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Casual,
            device_class: DeviceClass::Desktop,
            bot_count: 7,
            boost_pads: boost_pad::DEFAULT_COUNT,
            tick_rate: physics::TICK_RATE,
            seed: None,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            metrics_port: 9090,
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("MATCH_MODE") {
            match mode.to_ascii_lowercase().as_str() {
                "casual" => config.match_mode = MatchMode::Casual,
                "competitive" => config.match_mode = MatchMode::Competitive,
                _ => tracing::warn!("Invalid MATCH_MODE '{}', using default", mode),
            }
        }

        if let Ok(device) = std::env::var("DEVICE_CLASS") {
            match device.to_ascii_lowercase().as_str() {
                "desktop" => config.device_class = DeviceClass::Desktop,
                "mobile" | "portrait" => config.device_class = DeviceClass::Mobile,
                _ => tracing::warn!("Invalid DEVICE_CLASS '{}', using default", device),
            }
        }

        if let Ok(bots) = std::env::var("BOT_COUNT") {
            if let Ok(parsed) = bots.parse::<usize>() {
                if (1..=48).contains(&parsed) {
                    config.bot_count = parsed;
                } else {
                    tracing::warn!("BOT_COUNT must be 1-48, using default");
                }
            } else {
                tracing::warn!("Invalid BOT_COUNT '{}', using default", bots);
            }
        }

        if let Ok(pads) = std::env::var("BOOST_PADS") {
            if let Ok(parsed) = pads.parse::<usize>() {
                config.boost_pads = parsed;
            } else {
                tracing::warn!("Invalid BOOST_PADS '{}', using default", pads);
            }
        }

        if let Ok(rate) = std::env::var("TICK_RATE") {
            if let Ok(parsed) = rate.parse::<u32>() {
                if (10..=240).contains(&parsed) {
                    config.tick_rate = parsed;
                } else {
                    tracing::warn!("TICK_RATE must be 10-240, using default");
                }
            } else {
                tracing::warn!("Invalid TICK_RATE '{}', using default", rate);
            }
        }

        if let Ok(seed) = std::env::var("SIM_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.seed = Some(parsed);
            } else {
                tracing::warn!("Invalid SIM_SEED '{}', using random seed", seed);
            }
        }

        if let Ok(width) = std::env::var("VIEWPORT_WIDTH") {
            match width.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 => config.viewport_width = parsed,
                _ => tracing::warn!("Invalid VIEWPORT_WIDTH '{}', using default", width),
            }
        }

        if let Ok(height) = std::env::var("VIEWPORT_HEIGHT") {
            match height.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 => config.viewport_height = parsed,
                _ => tracing::warn!("Invalid VIEWPORT_HEIGHT '{}', using default", height),
            }
        }

        if let Ok(port) = std::env::var("METRICS_PORT") {
            match port.parse::<u16>() {
                Ok(parsed) if parsed > 0 => config.metrics_port = parsed,
                _ => tracing::warn!("Invalid METRICS_PORT '{}', using default", port),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=48).contains(&self.bot_count) {
            return Err(ConfigError::BotCount(self.bot_count));
        }
        if !(10..=240).contains(&self.tick_rate) {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(ConfigError::Viewport(self.viewport_width, self.viewport_height));
        }
        if self.metrics_port == 0 {
            return Err(ConfigError::MetricsPort);
        }
        Ok(())
    }

    /// Milliseconds between host ticks
    pub fn tick_interval_ms(&self) -> u64 {
        (1000 / self.tick_rate.max(1)) as u64
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("bot_count must be 1-48, got {0}")]
    BotCount(usize),
    #[error("tick_rate must be 10-240 Hz, got {0}")]
    TickRate(u32),
    #[error("viewport must be positive, got {0}x{1}")]
    Viewport(f32, f32),
    #[error("metrics port cannot be 0")]
    MetricsPort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.match_mode, MatchMode::Casual);
        assert_eq!(config.device_class, DeviceClass::Desktop);
        assert_eq!(config.bot_count, 7);
        assert_eq!(config.boost_pads, 10);
        assert_eq!(config.tick_rate, physics::TICK_RATE);
        assert_eq!(config.tick_interval_ms(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = SimConfig::load_or_default();
        assert!(config.tick_rate >= 10);
        assert!(config.viewport_width > 0.0);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = SimConfig {
            bot_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BotCount(0)));

        let config = SimConfig {
            tick_rate: 500,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TickRate(500)));

        let config = SimConfig {
            viewport_height: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Viewport(_, _))));
    }

    #[test]
    fn test_tick_interval() {
        let config = SimConfig {
            tick_rate: 50,
            ..Default::default()
        };
        assert_eq!(config.tick_interval_ms(), 20);
    }
}
