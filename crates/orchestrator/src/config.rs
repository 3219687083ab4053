//! Orchestrator configuration.

use std::env;
use std::time::Duration;

use nudge_core::ConfigError;

/// Default time allowed for one channel send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of users processed at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Batch and send settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Per-send timeout; an expired send is logged as failed.
    pub send_timeout: Duration,
    /// Users processed concurrently in a batch.
    pub max_concurrency: usize,
    /// Skip claiming and logging; the selected text still goes to the
    /// sender as a preview, so pair this with [`LoggingSender`].
    ///
    /// [`LoggingSender`]: crate::LoggingSender
    pub dry_run: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            dry_run: false,
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional:
    /// - `NUDGE_SEND_TIMEOUT_SECS` (default: 10)
    /// - `NUDGE_MAX_CONCURRENCY` (default: 4)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(secs) = read_positive("NUDGE_SEND_TIMEOUT_SECS")? {
            config.send_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = read_positive("NUDGE_MAX_CONCURRENCY")? {
            config.max_concurrency = n as usize;
        }

        Ok(config)
    }

    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }
}

/// Builder for OrchestratorConfig.
#[derive(Debug, Default)]
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    /// Zero is raised to one.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = n.max(1);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn build(self) -> OrchestratorConfig {
        self.config
    }
}

fn read_positive(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = OrchestratorConfig::builder()
            .send_timeout(Duration::from_secs(3))
            .max_concurrency(0)
            .dry_run(true)
            .build();
        assert_eq!(config.send_timeout, Duration::from_secs(3));
        assert_eq!(config.max_concurrency, 1);
        assert!(config.dry_run);
    }

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear() {
            std::env::remove_var("NUDGE_SEND_TIMEOUT_SECS");
            std::env::remove_var("NUDGE_MAX_CONCURRENCY");
        }

        clear();
        assert_eq!(OrchestratorConfig::from_env().unwrap(), OrchestratorConfig::default());

        std::env::set_var("NUDGE_SEND_TIMEOUT_SECS", "5");
        std::env::set_var("NUDGE_MAX_CONCURRENCY", "16");
        let config = OrchestratorConfig::from_env().unwrap();
        assert_eq!(config.send_timeout, Duration::from_secs(5));
        assert_eq!(config.max_concurrency, 16);
        assert!(!config.dry_run);

        clear();
        std::env::set_var("NUDGE_MAX_CONCURRENCY", "zero");
        assert!(matches!(
            OrchestratorConfig::from_env(),
            Err(ConfigError::Invalid { name: "NUDGE_MAX_CONCURRENCY", .. })
        ));

        clear();
    }
}
