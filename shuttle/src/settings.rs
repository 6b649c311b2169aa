//! Ambient tunables: ring buffer capacity, GC TTL, compaction threshold, fan-out
//! concurrency, and the SQLite paths the stores open. Loaded the way the rest of
//! this workspace loads configuration — `env_config::load_and_apply` populates the
//! process environment from `.env`/XDG `config.toml`, then [`Settings::from_env`]
//! reads it into a typed, `Default`-backed struct (§1.1 "Configuration").

use std::path::PathBuf;
use std::time::Duration;

use crate::conversation::DEFAULT_COMPACTION_THRESHOLD;
use crate::events::{DEFAULT_RING_CAPACITY, DEFAULT_SUBSCRIBER_QUEUE, DEFAULT_TOPIC_TTL};

/// The XDG app name this crate loads its `.env`/`config.toml` overrides under.
pub const APP_NAME: &str = "shuttle";

/// Default bound on concurrent children a map/fan-out node runs at once.
pub const DEFAULT_MAP_CONCURRENCY: usize = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub event_ring_capacity: usize,
    pub subscriber_queue_size: usize,
    pub topic_gc_ttl: Duration,
    pub compaction_threshold: f64,
    pub default_map_concurrency: usize,
    pub event_store_path: PathBuf,
    pub checkpoint_store_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            event_ring_capacity: DEFAULT_RING_CAPACITY,
            subscriber_queue_size: DEFAULT_SUBSCRIBER_QUEUE,
            topic_gc_ttl: DEFAULT_TOPIC_TTL,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            default_map_concurrency: DEFAULT_MAP_CONCURRENCY,
            event_store_path: PathBuf::from("shuttle_events.db"),
            checkpoint_store_path: PathBuf::from("shuttle_checkpoints.db"),
        }
    }
}

impl Settings {
    /// Applies `.env`/XDG overrides to the process environment (best-effort — a
    /// missing or absent config source is not an error) and reads tunables from it,
    /// falling back to [`Settings::default`] for anything unset or unparsable.
    pub fn from_env() -> Self {
        if let Err(err) = env_config::load_and_apply(APP_NAME, None) {
            tracing::debug!(error = %err, "settings: no ambient config applied");
        }

        let defaults = Self::default();
        Self {
            event_ring_capacity: env_usize("SHUTTLE_EVENT_RING_CAPACITY", defaults.event_ring_capacity),
            subscriber_queue_size: env_usize("SHUTTLE_SUBSCRIBER_QUEUE_SIZE", defaults.subscriber_queue_size),
            topic_gc_ttl: Duration::from_secs(
                env_usize("SHUTTLE_TOPIC_GC_TTL_SECS", defaults.topic_gc_ttl.as_secs() as usize) as u64,
            ),
            compaction_threshold: env_f64("SHUTTLE_COMPACTION_THRESHOLD", defaults.compaction_threshold),
            default_map_concurrency: env_usize("SHUTTLE_MAP_CONCURRENCY", defaults.default_map_concurrency),
            event_store_path: env_path("SHUTTLE_EVENT_STORE_PATH", defaults.event_store_path),
            checkpoint_store_path: env_path("SHUTTLE_CHECKPOINT_STORE_PATH", defaults.checkpoint_store_path),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: with no overrides set, every field matches the documented default.
    #[test]
    fn defaults_match_component_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.event_ring_capacity, DEFAULT_RING_CAPACITY);
        assert_eq!(settings.compaction_threshold, DEFAULT_COMPACTION_THRESHOLD);
        assert_eq!(settings.default_map_concurrency, DEFAULT_MAP_CONCURRENCY);
    }

    /// **Scenario**: an env var override is parsed in preference to the default.
    #[test]
    fn env_override_wins() {
        std::env::set_var("SHUTTLE_MAP_CONCURRENCY_TEST_PROBE", "9");
        assert_eq!(env_usize("SHUTTLE_MAP_CONCURRENCY_TEST_PROBE", 5), 9);
        std::env::remove_var("SHUTTLE_MAP_CONCURRENCY_TEST_PROBE");
    }

    /// **Scenario**: an unparsable override falls back to the default rather than panicking.
    #[test]
    fn unparsable_override_falls_back_to_default() {
        std::env::set_var("SHUTTLE_MAP_CONCURRENCY_TEST_PROBE2", "not-a-number");
        assert_eq!(env_usize("SHUTTLE_MAP_CONCURRENCY_TEST_PROBE2", 5), 5);
        std::env::remove_var("SHUTTLE_MAP_CONCURRENCY_TEST_PROBE2");
    }
}
