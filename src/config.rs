//! Service settings, read from `TIMETABLE_*` environment variables.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse '{value}'")]
    Malformed { var: &'static str, value: String },
    #[error("{var} must be at least 1")]
    Zero { var: &'static str },
    #[error("TIMETABLE_DEFAULT_ATTEMPTS ({default}) exceeds TIMETABLE_MAX_ATTEMPTS ({max})")]
    AttemptsOutOfOrder { default: u32, max: u32 },
}

/// Upper bounds applied to incoming requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_days: usize,
    pub max_periods: usize,
    pub max_quota: u32,
    /// Retry budget of strict generation when the request names none.
    pub default_attempts: u32,
    pub max_attempts: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_days: 7,
            max_periods: 10,
            max_quota: 10,
            default_attempts: 100,
            max_attempts: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub limits: Limits,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the settings from any variable source; unset variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Limits::default();
        let addr = parse_var(&lookup, "TIMETABLE_ADDR", default_addr())?;
        let limits = Limits {
            max_days: positive(&lookup, "TIMETABLE_MAX_DAYS", defaults.max_days)?,
            max_periods: positive(&lookup, "TIMETABLE_MAX_PERIODS", defaults.max_periods)?,
            max_quota: positive(&lookup, "TIMETABLE_MAX_QUOTA", defaults.max_quota)?,
            default_attempts: positive(
                &lookup,
                "TIMETABLE_DEFAULT_ATTEMPTS",
                defaults.default_attempts,
            )?,
            max_attempts: positive(&lookup, "TIMETABLE_MAX_ATTEMPTS", defaults.max_attempts)?,
        };
        if limits.default_attempts > limits.max_attempts {
            return Err(ConfigError::AttemptsOutOfOrder {
                default: limits.default_attempts,
                max: limits.max_attempts,
            });
        }
        Ok(Self { addr, limits })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            limits: Limits::default(),
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Malformed {
            var,
            value: raw.clone(),
        }),
    }
}

fn positive<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialEq + Default,
{
    let value = parse_var(lookup, var, default)?;
    if value == T::default() {
        return Err(ConfigError::Zero { var });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.limits.max_days, 7);
        assert_eq!(config.limits.max_periods, 10);
        assert_eq!(config.limits.max_quota, 10);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TIMETABLE_ADDR", "0.0.0.0:3000"),
            ("TIMETABLE_MAX_PERIODS", " 12 "),
            ("TIMETABLE_MAX_ATTEMPTS", "50"),
            ("TIMETABLE_DEFAULT_ATTEMPTS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.limits.max_periods, 12);
        assert_eq!(config.limits.max_attempts, 50);
        assert_eq!(config.limits.default_attempts, 10);
    }

    #[test]
    fn test_malformed_value() {
        let err =
            ServerConfig::from_lookup(lookup(&[("TIMETABLE_MAX_DAYS", "seven")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Malformed {
                var: "TIMETABLE_MAX_DAYS",
                value: "seven".into()
            }
        );
        assert!(ServerConfig::from_lookup(lookup(&[("TIMETABLE_ADDR", "nowhere")])).is_err());
    }

    #[test]
    fn test_zero_and_ordering() {
        let err =
            ServerConfig::from_lookup(lookup(&[("TIMETABLE_MAX_QUOTA", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::Zero { var: "TIMETABLE_MAX_QUOTA" });

        let err =
            ServerConfig::from_lookup(lookup(&[("TIMETABLE_MAX_ATTEMPTS", "5")])).unwrap_err();
        assert_eq!(err, ConfigError::AttemptsOutOfOrder { default: 100, max: 5 });
    }
}
