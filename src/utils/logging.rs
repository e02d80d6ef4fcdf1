use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::settings::{AccessSettings, LogFormat, LoggingConfig};

/// Initialize logging from settings, falling back to `info` / compact.
pub fn run(settings: &AccessSettings) {
    init_logging(&logging_config(settings));
}

fn logging_config(settings: &AccessSettings) -> LoggingConfig {
    settings.logging.clone().unwrap_or_default()
}

/// Initialize tracing with the desired config.
///
/// Returns false when a global subscriber was already installed.
pub fn init_logging(cfg: &LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_new(&cfg.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true) // flattens fields, good for CRI log parsers
                .with_ansi(false); // CRI parsers dislike ANSI color codes

            registry.with(layer).try_init().is_ok()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            registry.with(layer).try_init().is_ok()
        }
    }
}
