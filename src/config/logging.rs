//! Logging configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Per-component levels, e.g. {"connection": "debug", "proxy": "warn"}
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        }
    }
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

fn is_level(value: &str) -> bool {
    LEVELS.contains(&value.to_ascii_lowercase().as_str())
}

impl LoggingConfig {
    /// First setting that is not a plain level name, as `(field, value)`.
    ///
    /// `RUST_LOG` accepts full filter directives; the config file only
    /// accepts level names so a typo fails at startup.
    pub fn invalid_level(&self) -> Option<(String, String)> {
        if !is_level(&self.level) {
            return Some(("logging.level".to_string(), self.level.clone()));
        }
        let mut components: Vec<_> = self.component_levels.iter().flatten().collect();
        components.sort();
        components
            .into_iter()
            .find(|(_, level)| !is_level(level))
            .map(|(component, level)| {
                (
                    format!("logging.component_levels.{}", component),
                    level.clone(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.component_levels.is_none());
    }

    #[test]
    fn test_invalid_level_reports_field() {
        let mut config = LoggingConfig::default();
        assert!(config.invalid_level().is_none());

        config.level = "WARN".to_string();
        assert!(config.invalid_level().is_none());

        config.component_levels = Some(HashMap::from([
            ("store".to_string(), "trace".to_string()),
            ("connection".to_string(), "loud".to_string()),
        ]));
        assert_eq!(
            config.invalid_level(),
            Some((
                "logging.component_levels.connection".to_string(),
                "loud".to_string()
            ))
        );

        config.level = "verbose".to_string();
        assert_eq!(config.invalid_level().unwrap().0, "logging.level");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("PRETTY").unwrap(), LogFormat::Pretty);
        assert!(LogFormat::from_str("xml").is_err());
    }

    #[test]
    fn test_component_levels_from_toml() {
        let config: LoggingConfig = toml::from_str(
            r#"
            level = "warn"
            format = "json"
            [component_levels]
            connection = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(
            config.component_levels.unwrap().get("connection").map(String::as_str),
            Some("debug")
        );
    }
}
