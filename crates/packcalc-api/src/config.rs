//! # Service Configuration
//!
//! Reads the service settings from environment variables. Every variable is
//! optional; a value that is present but malformed fails start-up with a
//! [`ConfigError`] instead of silently falling back to the default.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `SERVER_PORT` | `8080` | Listen port |
//! | `DATABASE_URL` | unset | Enables PostgreSQL persistence |
//! | `RATE_LIMITER` | `enabled` | Anything other than `enabled` disables limiting |
//! | `RATE_LIMITER_MAX_REQUESTS` | `10` | Requests per client per second |
//! | `DEFAULT_PACK_SIZES` | `250,500,1000,2000,5000` | Seed configuration; empty for none |
//! | `CALCULATION_CACHE_CAPACITY` | `10000` | In-process memo entries |
//! | `MAX_CONCURRENT_SOLVES` | `4` | Optimizer runs allowed at once |
//! | `METRICS_ENABLED` | `true` | Prometheus recorder and `/metrics` |
//! | `LOG_FORMAT` | `text` | `json` for structured log lines |

use packcalc_core::{PackError, PackSizeSet};
use thiserror::Error;

use crate::middleware::rate_limit::RateLimitConfig;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_REQUESTS: u64 = 10;
pub const DEFAULT_PACK_SIZES: [i64; 5] = [250, 500, 1000, 2000, 5000];
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
pub const DEFAULT_MAX_CONCURRENT_SOLVES: usize = 4;

/// Error loading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("DEFAULT_PACK_SIZES is invalid: {0}")]
    InvalidPackSizes(#[source] PackError),
}

/// Log line format for the binaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Runtime configuration for the API server.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// PostgreSQL connection string. `None` runs in-memory only.
    pub database_url: Option<String>,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimitConfig>,
    /// Configuration served until one is submitted or loaded from storage.
    pub default_pack_sizes: Option<PackSizeSet>,
    pub cache_capacity: usize,
    /// Solves running at once; further requests wait for a permit.
    pub max_concurrent_solves: usize,
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("rate_limit", &self.rate_limit)
            .field(
                "default_pack_sizes",
                &self.default_pack_sizes.as_ref().map(PackSizeSet::to_vec),
            )
            .field("cache_capacity", &self.cache_capacity)
            .field("max_concurrent_solves", &self.max_concurrent_solves)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            rate_limit: Some(RateLimitConfig::per_second(DEFAULT_MAX_REQUESTS)),
            default_pack_sizes: PackSizeSet::normalize(DEFAULT_PACK_SIZES).ok(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_concurrent_solves: DEFAULT_MAX_CONCURRENT_SOLVES,
            metrics_enabled: true,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("SERVER_PORT") {
            Some(raw) => parse_number::<u16>("SERVER_PORT", &raw, "a port number")?,
            None => defaults.port,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let limiter_enabled = lookup("RATE_LIMITER")
            .map(|v| v.trim().eq_ignore_ascii_case("enabled"))
            .unwrap_or(true);
        let max_requests = match lookup("RATE_LIMITER_MAX_REQUESTS") {
            Some(raw) => {
                let n = parse_number::<u64>(
                    "RATE_LIMITER_MAX_REQUESTS",
                    &raw,
                    "a positive integer",
                )?;
                if n == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "RATE_LIMITER_MAX_REQUESTS",
                        value: raw,
                        expected: "a positive integer",
                    });
                }
                n
            }
            None => DEFAULT_MAX_REQUESTS,
        };
        let rate_limit = limiter_enabled.then(|| RateLimitConfig::per_second(max_requests));

        let default_pack_sizes = match lookup("DEFAULT_PACK_SIZES") {
            Some(raw) => parse_pack_sizes(&raw)?,
            None => defaults.default_pack_sizes,
        };

        let cache_capacity = match lookup("CALCULATION_CACHE_CAPACITY") {
            Some(raw) => parse_number::<usize>(
                "CALCULATION_CACHE_CAPACITY",
                &raw,
                "a non-negative integer",
            )?,
            None => defaults.cache_capacity,
        };

        let max_concurrent_solves = match lookup("MAX_CONCURRENT_SOLVES") {
            Some(raw) => {
                let n = parse_number::<usize>("MAX_CONCURRENT_SOLVES", &raw, "a positive integer")?;
                if n == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "MAX_CONCURRENT_SOLVES",
                        value: raw,
                        expected: "a positive integer",
                    });
                }
                n
            }
            None => defaults.max_concurrent_solves,
        };

        let metrics_enabled = match lookup("METRICS_ENABLED") {
            Some(raw) => parse_bool("METRICS_ENABLED", &raw)?,
            None => defaults.metrics_enabled,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "\"text\" or \"json\"",
                })
            }
        };

        Ok(Self {
            port,
            database_url,
            rate_limit,
            default_pack_sizes,
            cache_capacity,
            max_concurrent_solves,
            metrics_enabled,
            log_format,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    raw: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        expected,
    })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            expected: "a boolean",
        }),
    }
}

/// Comma-separated sizes. An empty value means "start unconfigured".
fn parse_pack_sizes(raw: &str) -> Result<Option<PackSizeSet>, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let sizes = raw
        .split(',')
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| ConfigError::InvalidValue {
                name: "DEFAULT_PACK_SIZES",
                value: raw.to_string(),
                expected: "comma-separated integers",
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    PackSizeSet::normalize(sizes)
        .map(Some)
        .map_err(ConfigError::InvalidPackSizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert_eq!(config.rate_limit.as_ref().unwrap().max_requests, 10);
        assert_eq!(
            config.default_pack_sizes.unwrap().to_vec(),
            vec![5000, 2000, 1000, 500, 250]
        );
        assert_eq!(config.cache_capacity, 10_000);
        assert_eq!(config.max_concurrent_solves, 4);
        assert!(config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("SERVER_PORT", "9090"),
            ("DATABASE_URL", "postgres://u:p@localhost/packs"),
            ("RATE_LIMITER", "disabled"),
            ("DEFAULT_PACK_SIZES", "23, 31,53"),
            ("CALCULATION_CACHE_CAPACITY", "5"),
            ("MAX_CONCURRENT_SOLVES", "2"),
            ("METRICS_ENABLED", "false"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert!(config.database_url.is_some());
        assert!(config.rate_limit.is_none());
        assert_eq!(config.default_pack_sizes.unwrap().to_vec(), vec![53, 31, 23]);
        assert_eq!(config.cache_capacity, 5);
        assert_eq!(config.max_concurrent_solves, 2);
        assert!(!config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn empty_default_sizes_start_unconfigured() {
        let config = load(&[("DEFAULT_PACK_SIZES", "")]).unwrap();
        assert!(config.default_pack_sizes.is_none());
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            load(&[("SERVER_PORT", "eighty")]),
            Err(ConfigError::InvalidValue { name: "SERVER_PORT", .. })
        ));
        assert!(matches!(
            load(&[("RATE_LIMITER_MAX_REQUESTS", "0")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            load(&[("DEFAULT_PACK_SIZES", "250,abc")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            load(&[("DEFAULT_PACK_SIZES", "250,-1")]),
            Err(ConfigError::InvalidPackSizes(_))
        ));
        assert!(matches!(
            load(&[("MAX_CONCURRENT_SOLVES", "0")]),
            Err(ConfigError::InvalidValue { name: "MAX_CONCURRENT_SOLVES", .. })
        ));
        assert!(matches!(
            load(&[("METRICS_ENABLED", "maybe")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn debug_redacts_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://user:hunter2@db/packs")]).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
