//! Environment configuration shared by both binaries

use crate::ControllerSettings;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Source of configuration values, `std::env::var` in production
pub trait Lookup {
    fn get(&self, name: &str) -> Option<String>;
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Reads the process environment
pub fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub fn required<T>(lookup: &impl Lookup, name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = lookup.get(name).ok_or(ConfigError::Missing(name))?;
    parse(name, value)
}

pub fn optional<T>(lookup: &impl Lookup, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup.get(name) {
        Some(value) => parse(name, value),
        None => Ok(default),
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

pub fn invalid(name: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// `METRICS_ADDR`, default `0.0.0.0:8080`
pub fn metrics_addr(lookup: &impl Lookup) -> Result<SocketAddr, ConfigError> {
    optional(lookup, "METRICS_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))
}

impl ControllerSettings {
    /// `RECONCILE_CONCURRENCY` and `RECONCILE_TIMEOUT_SECS` over the defaults
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let defaults = ControllerSettings::default();

        let concurrency: u16 = optional(lookup, "RECONCILE_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            return Err(invalid("RECONCILE_CONCURRENCY", concurrency, "must be at least 1"));
        }

        let timeout_secs: u64 =
            optional(lookup, "RECONCILE_TIMEOUT_SECS", defaults.timeout.as_secs())?;
        if timeout_secs == 0 {
            return Err(invalid("RECONCILE_TIMEOUT_SECS", timeout_secs, "must be at least 1"));
        }

        Ok(Self {
            concurrency,
            timeout: Duration::from_secs(timeout_secs),
            ..defaults
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_controller_settings_defaults() {
        let settings = ControllerSettings::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_controller_settings_overrides() {
        let settings = ControllerSettings::from_lookup(&lookup(&[
            ("RECONCILE_CONCURRENCY", "16"),
            ("RECONCILE_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.concurrency, 16);
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = ControllerSettings::from_lookup(&lookup(&[("RECONCILE_CONCURRENCY", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "RECONCILE_CONCURRENCY", .. })
        ));
    }

    #[test]
    fn test_required_missing() {
        let result: Result<u32, _> = required(&lookup(&[]), "VNI");
        assert!(matches!(result, Err(ConfigError::Missing("VNI"))));
    }

    #[test]
    fn test_metrics_addr() {
        assert_eq!(
            metrics_addr(&lookup(&[])).unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(metrics_addr(&lookup(&[("METRICS_ADDR", "nope")])).is_err());
    }
}
