use chrono::Duration;
use serde::Deserialize;

use crate::access::STALE_TOKEN_DURATION_SECONDS;

/// ================================
/// Access info settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AccessSettings {
    /// gap used by expiry checks
    #[serde(default = "default_stale_duration_seconds")]
    pub stale_duration_seconds: u64,
    pub logging: Option<LoggingConfig>,
}

impl AccessSettings {
    pub fn stale_duration(&self) -> Duration {
        i64::try_from(self.stale_duration_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            stale_duration_seconds: default_stale_duration_seconds(),
            logging: None,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_stale_duration_seconds() -> u64 {
    STALE_TOKEN_DURATION_SECONDS.unsigned_abs()
}
