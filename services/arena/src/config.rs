use std::path::PathBuf;
use std::time::Duration;

use gauntlet_execution::DayConfig;

/// Service settings, read from `ARENA_*` environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    pub host: String,
    pub port: u16,
    pub poll_ms: u64,
    pub feast_pause_ms: u64,
    pub command_buffer: usize,
    pub announce_buffer: usize,
    /// Queued snapshot requests for the SQLite worker.
    pub store_buffer: usize,
    pub starting_balance: u64,
    pub day_per_tribute_ms: u64,
    pub day_base_ms: u64,
    pub day_min_ms: u64,
    pub day_max_ms: u64,
    /// SQLite snapshot store; in-memory when unset.
    pub db_path: Option<PathBuf>,
    /// Master seed for session RNGs; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::from_source(|_| None)
    }
}

impl ArenaConfig {
    pub fn from_env() -> Self {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Missing or unparsable values fall back to defaults.
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Self {
        let day = DayConfig::default();
        Self {
            host: source("ARENA_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: read_u16(&source, "ARENA_PORT", 9124),
            poll_ms: read_ms(&source, "ARENA_POLL_MS", 1_000).max(1),
            feast_pause_ms: read_ms(&source, "ARENA_FEAST_PAUSE_MS", 3_000),
            command_buffer: read_usize(&source, "ARENA_COMMAND_BUFFER", 64).max(1),
            announce_buffer: read_usize(&source, "ARENA_ANNOUNCE_BUFFER", 1_024).max(1),
            store_buffer: read_usize(&source, "ARENA_STORE_BUFFER", 256).max(1),
            starting_balance: read_u64(&source, "ARENA_STARTING_BALANCE", 1_000),
            day_per_tribute_ms: read_ms(&source, "ARENA_DAY_PER_TRIBUTE_MS", day.per_tribute_ms),
            day_base_ms: read_ms(&source, "ARENA_DAY_BASE_MS", day.base_ms),
            day_min_ms: read_ms(&source, "ARENA_DAY_MIN_MS", day.min_ms),
            day_max_ms: read_ms(&source, "ARENA_DAY_MAX_MS", day.max_ms),
            db_path: source("ARENA_DB_PATH")
                .filter(|raw| !raw.trim().is_empty())
                .map(PathBuf::from),
            seed: source("ARENA_SEED").and_then(|raw| raw.trim().parse::<u64>().ok()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn feast_pause(&self) -> Duration {
        Duration::from_millis(self.feast_pause_ms)
    }

    /// Day window sizing. Not validated here; `DayScheduler::new` rejects bad windows.
    pub fn day_config(&self) -> DayConfig {
        DayConfig {
            per_tribute_ms: self.day_per_tribute_ms,
            base_ms: self.day_base_ms,
            min_ms: self.day_min_ms,
            max_ms: self.day_max_ms,
            ..DayConfig::default()
        }
    }
}

fn read_ms(source: &impl Fn(&str) -> Option<String>, key: &str, fallback: u64) -> u64 {
    read_u64(source, key, fallback)
}

fn read_u64(source: &impl Fn(&str) -> Option<String>, key: &str, fallback: u64) -> u64 {
    source(key)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_u16(source: &impl Fn(&str) -> Option<String>, key: &str, fallback: u16) -> u16 {
    source(key)
        .and_then(|raw| raw.trim().parse::<u16>().ok())
        .unwrap_or(fallback)
}

fn read_usize(source: &impl Fn(&str) -> Option<String>, key: &str, fallback: usize) -> usize {
    source(key)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ArenaConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ArenaConfig::from_source(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.poll_ms, 1_000);
        assert_eq!(config.feast_pause_ms, 3_000);
        assert_eq!(config.command_buffer, 64);
        assert_eq!(config.store_buffer, 256);
        assert_eq!(config.announce_buffer, 1_024);
        assert_eq!(config.starting_balance, 1_000);
        assert_eq!(config.db_path, None);
        assert_eq!(config.seed, None);
        assert_eq!(config.day_config(), DayConfig::default());
    }

    #[test]
    fn test_day_window_overrides() {
        let config = from_pairs(&[("ARENA_DAY_MIN_MS", "5000"), ("ARENA_DAY_MAX_MS", "9000")]);
        let day = config.day_config();
        assert_eq!(day.min_ms, 5_000);
        assert_eq!(day.max_ms, 9_000);
        assert_eq!(day.base_ms, DayConfig::default().base_ms);
        assert!(day.validate().is_ok());

        let inverted = from_pairs(&[("ARENA_DAY_MIN_MS", "9000"), ("ARENA_DAY_MAX_MS", "5000")]);
        assert!(inverted.day_config().validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("ARENA_PORT", "8080"),
            ("ARENA_POLL_MS", "250"),
            ("ARENA_DB_PATH", "/tmp/arena.db"),
            ("ARENA_SEED", " 7 "),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/arena.db")));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = from_pairs(&[
            ("ARENA_PORT", "99999"),
            ("ARENA_POLL_MS", "soon"),
            ("ARENA_COMMAND_BUFFER", "0"),
            ("ARENA_STARTING_BALANCE", "-5"),
            ("ARENA_DB_PATH", "  "),
            ("ARENA_SEED", "random"),
        ]);
        assert_eq!(config.port, 9124);
        assert_eq!(config.poll_ms, 1_000);
        assert_eq!(config.command_buffer, 1);
        assert_eq!(config.starting_balance, 1_000);
        assert_eq!(config.db_path, None);
        assert_eq!(config.seed, None);
    }
}
