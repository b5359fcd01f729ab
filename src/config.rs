use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::strength::StrengthRule;

// Highest count where an imbalance is still real hockey (6-on-5 extra attacker).
pub const DEFAULT_SKATER_CEILING: u32 = 6;
// Skaters rarely pass 30 minutes; a starting goalie plays the full 60.
pub const DEFAULT_GOALIE_TOI_SECS: u32 = 2700;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub skater_ceiling: u32,
    pub exclude_anomalies: bool,
    pub goalie_toi_secs: u32,
    pub parallelism: usize,
    #[serde(default)]
    pub game_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skater_ceiling: DEFAULT_SKATER_CEILING,
            exclude_anomalies: false,
            goalie_toi_secs: DEFAULT_GOALIE_TOI_SECS,
            parallelism: default_parallelism(),
            game_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let skater_ceiling = env::var("CORSI_SKATER_CEILING")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(defaults.skater_ceiling)
            .clamp(3, 10);
        let exclude_anomalies = env::var("CORSI_EXCLUDE_ANOMALIES")
            .ok()
            .map(|raw| {
                matches!(
                    raw.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "on" | "yes"
                )
            })
            .unwrap_or(defaults.exclude_anomalies);
        let goalie_toi_secs = env::var("CORSI_GOALIE_TOI_SECS")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(defaults.goalie_toi_secs)
            .clamp(1200, 4800);
        let parallelism = env::var("CORSI_PARALLELISM")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.parallelism)
            .clamp(1, 64);
        let game_timeout_ms = env::var("CORSI_GAME_TIMEOUT_MS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0);

        Self {
            skater_ceiling,
            exclude_anomalies,
            goalie_toi_secs,
            parallelism,
            game_timeout_ms,
        }
    }

    pub fn strength_rule(&self) -> StrengthRule {
        StrengthRule {
            skater_ceiling: self.skater_ceiling,
            exclude_anomalies: self.exclude_anomalies,
        }
    }

    pub fn game_timeout(&self) -> Option<Duration> {
        self.game_timeout_ms.map(Duration::from_millis)
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, 64)
}
