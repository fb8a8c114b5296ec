#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::rate_limiter::RateLimitConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1:3001";
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub bind: SocketAddr,
    /// SQLite file; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    pub cors_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub max_body_bytes: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3001)),
            db_path: None,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            rate_limit: RateLimitConfig {
                max_requests: DEFAULT_RATE_LIMIT_MAX,
                window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            },
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset or unparsable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let bind = parse_or("SURVEY_HTTP_BIND", &lookup, defaults.bind);
        let db_path = lookup("SURVEY_DB_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let cors_origins = lookup("SURVEY_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_origins);
        let max_requests = parse_or("SURVEY_RATE_LIMIT_MAX", &lookup, DEFAULT_RATE_LIMIT_MAX);
        let window_secs = parse_or(
            "SURVEY_RATE_LIMIT_WINDOW_SECS",
            &lookup,
            DEFAULT_RATE_LIMIT_WINDOW_SECS,
        );
        let config = Self {
            bind,
            db_path,
            cors_origins,
            rate_limit: RateLimitConfig {
                max_requests: if max_requests == 0 {
                    warn!("SURVEY_RATE_LIMIT_MAX must be positive, using default");
                    DEFAULT_RATE_LIMIT_MAX
                } else {
                    max_requests
                },
                window: Duration::from_secs(window_secs.max(1)),
            },
            max_body_bytes: MAX_BODY_BYTES,
        };
        info!(
            bind = %config.bind,
            db = ?config.db_path,
            origins = config.cors_origins.len(),
            rate_limit_max = config.rate_limit.max_requests,
            rate_limit_window_secs = config.rate_limit.window.as_secs(),
            "adapter config loaded"
        );
        config
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn at_config_01_defaults_when_nothing_is_set() {
        let config = AdapterConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, AdapterConfig::default());
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(900));
    }

    #[test]
    fn at_config_02_reads_every_variable() {
        let config = AdapterConfig::from_lookup(lookup_from(&[
            ("SURVEY_HTTP_BIND", "0.0.0.0:8088"),
            ("SURVEY_DB_PATH", "/var/lib/survey/survey.db"),
            ("SURVEY_CORS_ORIGINS", "https://survey.example.org, ,http://localhost:4173"),
            ("SURVEY_RATE_LIMIT_MAX", "5"),
            ("SURVEY_RATE_LIMIT_WINDOW_SECS", "60"),
        ]));
        assert_eq!(config.bind.port(), 8088);
        assert_eq!(config.db_path, Some(PathBuf::from("/var/lib/survey/survey.db")));
        assert_eq!(
            config.cors_origins,
            vec!["https://survey.example.org", "http://localhost:4173"]
        );
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
    }

    #[test]
    fn at_config_03_invalid_values_fall_back() {
        let config = AdapterConfig::from_lookup(lookup_from(&[
            ("SURVEY_HTTP_BIND", "not-an-addr"),
            ("SURVEY_DB_PATH", "   "),
            ("SURVEY_CORS_ORIGINS", ","),
            ("SURVEY_RATE_LIMIT_MAX", "0"),
            ("SURVEY_RATE_LIMIT_WINDOW_SECS", "soon"),
        ]));
        assert_eq!(config, AdapterConfig::default());
    }
}
