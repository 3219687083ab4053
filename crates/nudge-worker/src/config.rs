//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Default pause between scheduled batches.
pub const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(300);

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database URL.
    pub database_url: String,
    /// Pause between batches in loop mode.
    pub run_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:health_whisperer.db?mode=rwc` |
    /// | `NUDGE_RUN_INTERVAL_SECS` | Seconds between batches | `300` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:health_whisperer.db?mode=rwc".to_string());

        let run_interval = match env::var("NUDGE_RUN_INTERVAL_SECS") {
            Ok(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidRunInterval(value)),
            },
            Err(_) => DEFAULT_RUN_INTERVAL,
        };

        Ok(Self {
            database_url,
            run_interval,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NUDGE_RUN_INTERVAL_SECS must be a positive number of seconds, got {0:?}")]
    InvalidRunInterval(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        std::env::remove_var("SQLITE_PATH");
        std::env::remove_var("NUDGE_RUN_INTERVAL_SECS");
        let config = Config::from_env().unwrap();
        assert_eq!(config.database_url, "sqlite:health_whisperer.db?mode=rwc");
        assert_eq!(config.run_interval, DEFAULT_RUN_INTERVAL);

        std::env::set_var("SQLITE_PATH", "sqlite::memory:");
        std::env::set_var("NUDGE_RUN_INTERVAL_SECS", "60");
        let config = Config::from_env().unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.run_interval, Duration::from_secs(60));

        std::env::set_var("NUDGE_RUN_INTERVAL_SECS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidRunInterval(_))
        ));

        std::env::remove_var("SQLITE_PATH");
        std::env::remove_var("NUDGE_RUN_INTERVAL_SECS");
    }
}
