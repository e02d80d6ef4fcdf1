use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, error};

use crate::config::settings::{AccessSettings, LoggingConfig};

/// Load settings from a YAML file
pub fn file_to_settings(path: &Path) -> Result<AccessSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read settings file '{}'", path.display()))?;
    parse_settings(&content)
}

/// Parse settings from YAML, expanding `${VAR}` and `${VAR:default}` first.
pub fn parse_settings(content: &str) -> Result<AccessSettings> {
    let expanded = expand_env_vars(content)?;
    let mut settings: AccessSettings = serde_yaml::from_str(&expanded)
        .inspect_err(|e| error!("parse settings error: {}", e))?;

    // Apply defaults
    if settings.logging.is_none() {
        settings.logging = Some(LoggingConfig::default());
    }

    debug!("validating settings ...");
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &AccessSettings) -> Result<()> {
    if let Some(logging) = &settings.logging {
        if logging.level.trim().is_empty() {
            bail!("settings: 'logging.level' must not be empty");
        }
    }
    Ok(())
}

fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    let expanded = re.replace_all(input, |caps: &Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    });
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::LogFormat;
    use std::io::Write;

    #[test]
    fn test_parse_full_settings() {
        let yaml = r#"
stale_duration_seconds: 120
logging:
  level: debug
  format: json
"#;
        let settings = parse_settings(yaml).unwrap();
        assert_eq!(settings.stale_duration_seconds, 120);
        let logging = settings.logging.unwrap();
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);
    }

    #[test]
    fn test_defaults_applied() {
        let settings = parse_settings("{}").unwrap();
        assert_eq!(settings.stale_duration_seconds, 30);
        let logging = settings.logging.unwrap();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_env_default_expansion() {
        let yaml = "stale_duration_seconds: ${ACCESS_INFO_TEST_UNSET_STALE:45}\n";
        let settings = parse_settings(yaml).unwrap();
        assert_eq!(settings.stale_duration_seconds, 45);
    }

    #[test]
    fn test_empty_log_level_rejected() {
        let yaml = r#"
logging:
  level: ""
  format: compact
"#;
        assert!(parse_settings(yaml).is_err());
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(parse_settings("stale_duration_seconds: [").is_err());
    }

    #[test]
    fn test_file_to_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stale_duration_seconds: 5").unwrap();
        let settings = file_to_settings(file.path()).unwrap();
        assert_eq!(settings.stale_duration_seconds, 5);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_to_settings(&dir.path().join("absent.yaml")).is_err());
    }
}
