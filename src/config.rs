//! Application configuration module
//!
//! Handles loading and validating relay settings from an optional settings
//! file and `RELAY_*` environment variables.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Complete relay settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name stamped on every out topic event
    pub server_name: String,
    /// JSON type definition gallery loaded at startup
    pub types_file: PathBuf,
    /// JSON-lines instance events; stdin when unset
    pub events_file: Option<PathBuf>,
    pub out_topic_capacity: usize,
    pub max_supertype_depth: usize,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_name: "governance-server".to_string(),
            types_file: PathBuf::from("types/open-metadata-types.json"),
            events_file: None,
            out_topic_capacity: 256,
            max_supertype_depth: 32,
            log_format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Load settings from `.env`, the optional settings file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let file = std::env::var("RELAY_CONFIG").unwrap_or_else(|_| "relay.toml".to_string());

        Self::from_sources(&file, Self::environment())
    }

    /// `RELAY_*` variables, with numbers and booleans parsed
    fn environment() -> config::Environment {
        config::Environment::with_prefix("RELAY").try_parsing(true)
    }

    /// Layer the settings file under the environment; the environment wins
    fn from_sources(file: &str, environment: config::Environment) -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.out_topic_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "out_topic_capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_supertype_depth == 0 {
            return Err(ConfigError::InvalidValue(
                "max_supertype_depth must be greater than zero".to_string(),
            ));
        }
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("server_name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        Settings::environment().source(Some(
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        ))
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server_name, "governance-server");
        assert_eq!(settings.out_topic_capacity, 256);
        assert_eq!(settings.max_supertype_depth, 32);
        assert_eq!(settings.log_format, LogFormat::Compact);
        assert!(settings.events_file.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let settings = Settings {
            out_topic_capacity: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let settings = Settings {
            max_supertype_depth: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let settings = Settings::from_sources(
            "no-such-relay-settings",
            environment(&[
                ("RELAY_SERVER_NAME", "gov9"),
                ("RELAY_LOG_FORMAT", "json"),
                ("RELAY_OUT_TOPIC_CAPACITY", "16"),
                ("RELAY_EVENTS_FILE", "demos/events.jsonl"),
                ("UNRELATED_SERVER_NAME", "ignored"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.server_name, "gov9");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.out_topic_capacity, 16);
        assert_eq!(settings.events_file, Some(PathBuf::from("demos/events.jsonl")));
        assert_eq!(settings.max_supertype_depth, 32);
    }

    #[test]
    fn test_environment_layers_over_settings_file() {
        let path = std::env::temp_dir().join(format!("relay-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "server_name = \"file-server\"\nout_topic_capacity = 8\nmax_supertype_depth = 4\n").unwrap();

        let settings = Settings::from_sources(
            path.to_str().unwrap(),
            environment(&[("RELAY_OUT_TOPIC_CAPACITY", "64")]),
        );
        std::fs::remove_file(&path).unwrap();
        let settings = settings.unwrap();

        assert_eq!(settings.server_name, "file-server");
        assert_eq!(settings.out_topic_capacity, 64);
        assert_eq!(settings.max_supertype_depth, 4);
        assert_eq!(settings.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_invalid_environment_value_rejected() {
        let zero = Settings::from_sources("no-such-relay-settings", environment(&[("RELAY_OUT_TOPIC_CAPACITY", "0")]));
        assert!(matches!(zero, Err(ConfigError::InvalidValue(_))));

        let format = Settings::from_sources("no-such-relay-settings", environment(&[("RELAY_LOG_FORMAT", "xml")]));
        assert!(matches!(format, Err(ConfigError::Load(_))));
    }
}
