use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log level '{}', expected one of {:?}",
                self.level,
                LEVELS
            ));
        }

        Ok(())
    }

    /// Build the env filter, letting RUST_LOG win over the configured level
    pub fn env_filter(&self, verbose: bool) -> EnvFilter {
        let level = if verbose {
            "debug".to_string()
        } else {
            self.level.to_ascii_lowercase()
        };

        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("lbcluster={}", level)))
    }

    /// Install the global subscriber before any configuration is read.
    /// Messages logged while loading use the built-in level; the returned
    /// handle switches to the configured one.
    pub fn init_early(verbose: bool) -> anyhow::Result<LogHandle> {
        let (filter_layer, filter) = reload::Layer::new(Self::default().env_filter(verbose));
        let (format_layer, format) = reload::Layer::new(fmt::layer::<FilteredRegistry>());

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(format_layer)
            .try_init()?;

        Ok(LogHandle { filter, format })
    }
}

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

/// Handle to the installed subscriber
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    format: reload::Handle<fmt::Layer<FilteredRegistry>, FilteredRegistry>,
}

impl LogHandle {
    /// Apply the loaded logging configuration
    pub fn apply(&self, config: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
        self.filter.reload(config.env_filter(verbose))?;
        self.format
            .modify(|layer| *layer = fmt::layer().with_ansi(config.ansi))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_validation() {
        assert!(LoggingConfig::default().validate().is_ok());

        let upper = LoggingConfig {
            level: "DEBUG".to_string(),
            ..Default::default()
        };
        assert!(upper.validate().is_ok());

        let bogus = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(bogus.validate().is_err());
    }

    #[test]
    fn test_verbose_forces_debug() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "WARN".to_string(),
            ..Default::default()
        };

        assert_eq!(config.env_filter(false).to_string(), "lbcluster=warn");
        assert_eq!(config.env_filter(true).to_string(), "lbcluster=debug");
    }

    #[test]
    fn test_early_subscriber_switches_to_configured_level() {
        std::env::remove_var("RUST_LOG");
        let handle = LoggingConfig::init_early(false).unwrap();

        // Installed before any configuration exists
        assert!(tracing::enabled!(tracing::Level::WARN));
        assert!(!tracing::enabled!(tracing::Level::DEBUG));

        let config = LoggingConfig {
            level: "debug".to_string(),
            ansi: false,
        };
        handle.apply(&config, false).unwrap();
        assert!(tracing::enabled!(tracing::Level::DEBUG));

        // Only one global subscriber per process
        assert!(LoggingConfig::init_early(false).is_err());
    }
}
