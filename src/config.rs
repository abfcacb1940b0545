use std::env;
use std::fmt;
use std::str::FromStr;

use crate::constants;

/// Process-level configuration loaded from the environment. Engine tuning
/// parameters live in [`crate::engine::config::EngineConfig`]; this only
/// carries the knobs an operator adjusts per deployment.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub feed: FeedEnvConfig,
}

#[derive(Debug, Clone)]
pub struct FeedEnvConfig {
    pub candidate_limit: usize,
    pub upstream_timeout_ms: u64,
    pub profile_cache_ttl_secs: u64,
    pub coverage_cutoff: f64,
}

impl fmt::Display for FeedEnvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates={} timeout={}ms cacheTtl={}s cutoff={}",
            self.candidate_limit,
            self.upstream_timeout_ms,
            self.profile_cache_ttl_secs,
            self.coverage_cutoff
        )
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            feed: FeedEnvConfig {
                candidate_limit: env_or_parse(
                    "FEED_CANDIDATE_LIMIT",
                    constants::DEFAULT_CANDIDATE_LIMIT,
                ),
                upstream_timeout_ms: env_or_parse(
                    "FEED_UPSTREAM_TIMEOUT_MS",
                    constants::DEFAULT_UPSTREAM_TIMEOUT_MS,
                ),
                profile_cache_ttl_secs: env_or_parse(
                    "PROFILE_CACHE_TTL_SECS",
                    constants::DEFAULT_PROFILE_CACHE_TTL_SECS,
                ),
                coverage_cutoff: env_or_parse(
                    "FEED_COVERAGE_CUTOFF",
                    constants::DEFAULT_COVERAGE_CUTOFF,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "RUST_LOG",
            "ENABLE_FILE_LOGS",
            "FEED_CANDIDATE_LIMIT",
            "FEED_UPSTREAM_TIMEOUT_MS",
            "FEED_COVERAGE_CUTOFF",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.feed.candidate_limit, constants::DEFAULT_CANDIDATE_LIMIT);
        assert_eq!(
            cfg.feed.upstream_timeout_ms,
            constants::DEFAULT_UPSTREAM_TIMEOUT_MS
        );
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("FEED_CANDIDATE_LIMIT", "64");
        env::set_var("FEED_UPSTREAM_TIMEOUT_MS", "750");

        let cfg = Config::from_env();
        assert_eq!(cfg.feed.candidate_limit, 64);
        assert_eq!(cfg.feed.upstream_timeout_ms, 750);
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("FEED_CANDIDATE_LIMIT", "lots");
        env::set_var("FEED_COVERAGE_CUTOFF", "x");

        let cfg = Config::from_env();
        assert_eq!(cfg.feed.candidate_limit, constants::DEFAULT_CANDIDATE_LIMIT);
        assert_eq!(cfg.feed.coverage_cutoff, constants::DEFAULT_COVERAGE_CUTOFF);
    }
}
