//! Configuration management, read from the environment (and `.env`).

use anyhow::{anyhow, Context};
use std::env;
use std::time::Duration;

use crate::cache_key::DEFAULT_LANGUAGES;
use crate::formatter::TranscriptFormat;

/// Retention used when nothing else is configured.
pub const DEFAULT_RETENTION_DAYS: i64 = 60;

/// Upper bound for purge ages, from config or the admin endpoint.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Purge age for `days`, or `None` unless `1 <= days <= MAX_RETENTION_DAYS`.
pub fn retention_age(days: i64) -> Option<chrono::Duration> {
    if !(1..=MAX_RETENTION_DAYS).contains(&days) {
        return None;
    }
    chrono::Duration::try_days(days)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown STORE_BACKEND '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Minimum spacing between upstream calls, process-wide.
    pub min_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub supported_formats: Vec<TranscriptFormat>,
    pub default_languages: Vec<String>,
    pub retention_days: i64,
    /// Empty disables the scheduled purge.
    pub purge_cron: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Empty means no authentication.
    pub api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig { port: 8000 },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 5,
            },
            upstream: UpstreamConfig {
                base_url: "http://127.0.0.1:8100".to_string(),
                timeout_seconds: 30,
                min_interval: Duration::from_millis(2000),
            },
            cache: CacheConfig {
                supported_formats: vec![TranscriptFormat::Text],
                default_languages: DEFAULT_LANGUAGES.iter().map(|code| code.to_string()).collect(),
                retention_days: DEFAULT_RETENTION_DAYS,
                purge_cron: "0 0 3 * * *".to_string(),
            },
            auth: AuthConfig { api_key: String::new() },
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let supported_formats = csv(&var_or("SUPPORTED_FORMATS", "text"))
            .iter()
            .map(|tag| {
                tag.parse::<TranscriptFormat>()
                    .map_err(|e| anyhow!("SUPPORTED_FORMATS: {}", e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if supported_formats.is_empty() {
            return Err(anyhow!("SUPPORTED_FORMATS must list at least one format"));
        }

        let mut default_languages = csv(&var_or("DEFAULT_LANGUAGES", "pl,en"));
        if default_languages.is_empty() {
            default_languages = defaults.cache.default_languages.clone();
        }

        let retention_days: i64 = var_or("CACHE_RETENTION_DAYS", "60")
            .parse()
            .context("CACHE_RETENTION_DAYS")?;
        if retention_age(retention_days).is_none() {
            return Err(anyhow!(
                "CACHE_RETENTION_DAYS must be between 1 and {}",
                MAX_RETENTION_DAYS
            ));
        }

        Ok(Config {
            server: ServerConfig {
                port: var_or("PORT", "8000").parse().context("PORT")?,
            },
            database: DatabaseConfig {
                backend: var_or("STORE_BACKEND", "postgres").parse()?,
                url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", "10").parse()?,
                min_connections: var_or("DATABASE_MIN_CONNECTIONS", "1").parse()?,
                acquire_timeout_seconds: var_or("DATABASE_ACQUIRE_TIMEOUT_SECONDS", "5").parse()?,
            },
            upstream: UpstreamConfig {
                base_url: var_or("UPSTREAM_BASE_URL", &defaults.upstream.base_url),
                timeout_seconds: var_or("UPSTREAM_TIMEOUT_SECONDS", "30").parse()?,
                min_interval: Duration::from_millis(
                    var_or("UPSTREAM_MIN_INTERVAL_MS", "2000")
                        .parse()
                        .context("UPSTREAM_MIN_INTERVAL_MS")?,
                ),
            },
            cache: CacheConfig {
                supported_formats,
                default_languages,
                retention_days,
                purge_cron: var_or("PURGE_CRON", &defaults.cache.purge_cron).trim().to_string(),
            },
            auth: AuthConfig {
                api_key: var_or("TRANSCRIPT_API_KEY", ""),
            },
        })
    }

    pub fn auth_enabled(&self) -> bool {
        !self.auth.api_key.is_empty()
    }

    /// Configured retention; out-of-range values fall back to the default.
    pub fn retention(&self) -> chrono::Duration {
        retention_age(self.cache.retention_days)
            .unwrap_or_else(|| chrono::Duration::days(DEFAULT_RETENTION_DAYS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.supported_formats, vec![TranscriptFormat::Text]);
        assert_eq!(config.cache.default_languages, vec!["pl", "en"]);
        assert_eq!(config.upstream.min_interval, Duration::from_secs(2));
        assert!(!config.auth_enabled());
        assert_eq!(config.retention(), chrono::Duration::days(60));
    }

    #[test]
    fn test_retention_age_bounds() {
        assert_eq!(retention_age(60), Some(chrono::Duration::days(60)));
        assert_eq!(retention_age(MAX_RETENTION_DAYS), Some(chrono::Duration::days(36_500)));
        assert!(retention_age(0).is_none());
        assert!(retention_age(-5).is_none());
        assert!(retention_age(MAX_RETENTION_DAYS + 1).is_none());
        assert!(retention_age(100_000_000).is_none());
        assert!(retention_age(i64::MAX).is_none());
    }

    #[test]
    fn test_huge_configured_retention_does_not_panic() {
        let mut config = Config::default();
        config.cache.retention_days = i64::MAX;
        assert_eq!(config.retention(), chrono::Duration::days(DEFAULT_RETENTION_DAYS));
    }

    #[test]
    fn test_csv_parsing() {
        assert_eq!(csv(" text, srt ,,"), vec!["text", "srt"]);
        assert!(csv("").is_empty());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("PostgreSQL".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
