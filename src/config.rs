//! Startup configuration read from the environment

use crate::store::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub retry: RetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or unparsable values
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("FITNESS_DB_PATH").map(PathBuf::from).unwrap_or_else(|| {
            let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
            PathBuf::from(format!("{home}/.fitness-tracker/fitness.db"))
        });

        let defaults = RetryPolicy::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            db_path,
            port: lookup("FITNESS_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(8000),
            retry: RetryPolicy {
                max_attempts: number("FITNESS_STORE_ATTEMPTS")
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(defaults.max_attempts),
                base_backoff: number("FITNESS_STORE_BACKOFF_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.base_backoff),
                call_timeout: number("FITNESS_STORE_TIMEOUT_MS")
                    .filter(|n| *n > 0)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.call_timeout),
            },
        }
    }
}
