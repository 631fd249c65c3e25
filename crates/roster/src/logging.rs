//! Structured logging setup.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging options taken from the command line.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl LogConfig {
    /// Creates a human-readable logging config at the given level.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: false,
        }
    }

    /// Switches to JSON output when `json` is set.
    #[must_use]
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Installs the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(config: &LogConfig) -> bool {
    let result = if config.json {
        tracing_subscriber::registry()
            .with(config.filter())
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(config.filter())
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .try_init()
    };

    if result.is_err() {
        return false;
    }

    tracing::info!(level = %config.level, json = config.json, "Logging initialized");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config() {
        let config = LogConfig::new("debug").json(true);
        assert_eq!(config.level, "debug");
        assert!(config.json);
        assert!(!LogConfig::new("info").json);
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        let config = LogConfig::new("warn");
        init(&config);
        assert!(!init(&config));
    }
}
