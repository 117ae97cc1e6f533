//! Environment-driven runner configuration.

use hexsettle_core::{ControllerKind, Difficulty, GameConfig};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PLAYERS: usize = 4;
pub const DEFAULT_RADIUS: u32 = 2;
pub const DEFAULT_THINK_MS: u64 = 1500;
pub const DEFAULT_MAX_TURNS: u32 = 500;

/// Settings for a headless game
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub players: usize,
    pub radius: u32,
    pub seed: Option<u64>,
    pub difficulty: Difficulty,
    /// Pause before each AI turn
    pub think_delay: Duration,
    /// Stop after this many turns even without a winner
    pub max_turns: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            players: DEFAULT_PLAYERS,
            radius: DEFAULT_RADIUS,
            seed: None,
            difficulty: Difficulty::default(),
            think_delay: Duration::from_millis(DEFAULT_THINK_MS),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl RunnerConfig {
    /// Read `HEXSETTLE_*` variables; malformed values fall back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let players = parse_or(&lookup, "HEXSETTLE_PLAYERS", defaults.players);
        let players = if (2..=6).contains(&players) {
            players
        } else {
            warn!(players, "HEXSETTLE_PLAYERS out of range, using default");
            defaults.players
        };

        Self {
            players,
            radius: parse_or(&lookup, "HEXSETTLE_RADIUS", defaults.radius).max(1),
            seed: lookup("HEXSETTLE_SEED").and_then(|s| s.trim().parse().ok()),
            difficulty: parse_or(&lookup, "HEXSETTLE_DIFFICULTY", defaults.difficulty),
            think_delay: Duration::from_millis(parse_or(
                &lookup,
                "HEXSETTLE_THINK_MS",
                DEFAULT_THINK_MS,
            )),
            max_turns: parse_or(&lookup, "HEXSETTLE_MAX_TURNS", defaults.max_turns),
        }
    }

    /// All seats played by AI at the configured difficulty
    pub fn game_config(&self) -> GameConfig {
        let mut config = GameConfig::with_players(self.players, ControllerKind::Ai(self.difficulty));
        for (n, seat) in config.players.iter_mut().enumerate() {
            seat.name = format!("Bot {}", n + 1);
        }
        config.radius = self.radius;
        config.seed = self.seed;
        config
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring malformed setting");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(RunnerConfig::from_lookup(|_| None), RunnerConfig::default());
    }

    #[test]
    fn test_reads_every_setting() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("HEXSETTLE_PLAYERS", "3"),
            ("HEXSETTLE_RADIUS", "3"),
            ("HEXSETTLE_SEED", "42"),
            ("HEXSETTLE_DIFFICULTY", "hard"),
            ("HEXSETTLE_THINK_MS", "0"),
            ("HEXSETTLE_MAX_TURNS", "50"),
        ]));
        assert_eq!(config.players, 3);
        assert_eq!(config.radius, 3);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.think_delay, Duration::ZERO);
        assert_eq!(config.max_turns, 50);

        let game = config.game_config();
        assert_eq!(game.players.len(), 3);
        assert!(game.validate().is_ok());
        assert_eq!(game.players[0].name, "Bot 1");
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("HEXSETTLE_PLAYERS", "9"),
            ("HEXSETTLE_RADIUS", "big"),
            ("HEXSETTLE_SEED", "-1"),
            ("HEXSETTLE_DIFFICULTY", "expert"),
        ]));
        assert_eq!(config.players, DEFAULT_PLAYERS);
        assert_eq!(config.radius, DEFAULT_RADIUS);
        assert_eq!(config.seed, None);
        assert_eq!(config.difficulty, Difficulty::Medium);
    }
}
