//! Process configuration, read from environment variables.
//!
//! Every variable is optional. Missing values fall back to a logged default;
//! present-but-malformed values are a [`ConfigError`].

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use postgate_auth::{DEFAULT_SESSION_TTL_SECS, LoginPolicy, Role};

/// Upper bound on `SESSION_TTL_SECS`: ten years.
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is malformed: {value:?} ({reason})")]
    Malformed {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the API process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub cache_ttl: Duration,
    /// Adds `Secure` to the session cookie.
    pub cookie_secure: bool,
    pub auto_register: bool,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub db_acquire_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS as u64),
            sweep_interval: Duration::from_secs(3600),
            cache_ttl: Duration::from_secs(600),
            cookie_secure: false,
            auto_register: true,
            database_url: None,
            redis_url: None,
            db_acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = match read("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Malformed {
                    var: "BIND_ADDR",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => {
                tracing::info!(default = %defaults.bind_addr, "BIND_ADDR not set; using default");
                defaults.bind_addr
            }
        };

        let config = Self {
            bind_addr,
            session_ttl: secs(read("SESSION_TTL_SECS"), "SESSION_TTL_SECS", defaults.session_ttl)?,
            sweep_interval: secs(
                read("SESSION_SWEEP_INTERVAL_SECS"),
                "SESSION_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval,
            )?,
            cache_ttl: secs(read("CACHE_TTL_SECS"), "CACHE_TTL_SECS", defaults.cache_ttl)?,
            cookie_secure: flag(read("COOKIE_SECURE"), "COOKIE_SECURE", defaults.cookie_secure)?,
            auto_register: flag(read("AUTO_REGISTER"), "AUTO_REGISTER", defaults.auto_register)?,
            database_url: read("DATABASE_URL"),
            redis_url: read("REDIS_URL"),
            db_acquire_timeout: secs(
                read("DB_ACQUIRE_TIMEOUT_SECS"),
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.db_acquire_timeout,
            )?,
        };

        if config.session_ttl.is_zero() {
            return Err(ConfigError::Malformed {
                var: "SESSION_TTL_SECS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if config.session_ttl.as_secs() > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Malformed {
                var: "SESSION_TTL_SECS",
                value: config.session_ttl.as_secs().to_string(),
                reason: format!("must not exceed {MAX_SESSION_TTL_SECS}"),
            });
        }
        if config.database_url.is_none() {
            tracing::warn!("DATABASE_URL not set; using in-memory credential and item stores");
        }
        if config.redis_url.is_none() {
            tracing::warn!("REDIS_URL not set; using in-memory sessions and cache");
        }

        Ok(config)
    }

    pub fn login_policy(&self) -> LoginPolicy {
        LoginPolicy {
            auto_register: self.auto_register,
            default_role: Role::User,
        }
    }

    pub fn session_ttl_chrono(&self) -> chrono::Duration {
        let secs = self.session_ttl.as_secs().min(MAX_SESSION_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}

fn secs(raw: Option<String>, var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Malformed {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => {
            tracing::info!(var, default_secs = default.as_secs(), "not set; using default");
            Ok(default)
        }
    }
}

fn flag(raw: Option<String>, var: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        tracing::info!(var, default, "not set; using default");
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Malformed {
            var,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(from_pairs(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn values_are_parsed() {
        let cfg = from_pairs(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("SESSION_TTL_SECS", "60"),
            ("CACHE_TTL_SECS", "0"),
            ("COOKIE_SECURE", "true"),
            ("AUTO_REGISTER", "off"),
            ("REDIS_URL", "redis://localhost:6379"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.session_ttl, Duration::from_secs(60));
        assert_eq!(cfg.session_ttl_chrono(), chrono::Duration::seconds(60));
        assert!(cfg.cache_ttl.is_zero());
        assert!(cfg.cookie_secure);
        assert!(!cfg.login_policy().auto_register);
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(cfg.database_url, None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = from_pairs(&[("SESSION_TTL_SECS", "a day")]).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { var: "SESSION_TTL_SECS", .. }));

        let err = from_pairs(&[("COOKIE_SECURE", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { var: "COOKIE_SECURE", .. }));

        assert!(from_pairs(&[("BIND_ADDR", "not-an-addr")]).is_err());
        assert!(from_pairs(&[("SESSION_TTL_SECS", "0")]).is_err());
    }

    #[test]
    fn session_ttl_is_bounded() {
        for raw in ["10000000000000", "18446744073709551615"] {
            let err = from_pairs(&[("SESSION_TTL_SECS", raw)]).unwrap_err();
            assert!(matches!(err, ConfigError::Malformed { var: "SESSION_TTL_SECS", .. }));
        }

        let max = MAX_SESSION_TTL_SECS.to_string();
        let cfg = from_pairs(&[("SESSION_TTL_SECS", max.as_str())]).unwrap();
        assert_eq!(
            cfg.session_ttl_chrono(),
            chrono::Duration::seconds(MAX_SESSION_TTL_SECS as i64)
        );
        assert!(cfg.session_ttl_chrono() > chrono::Duration::zero());
    }
}
