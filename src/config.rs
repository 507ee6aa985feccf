//! Configuration loading and management.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Framework configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FrameworkConfig {
    /// Text-invocation prefix.
    #[serde(default)]
    pub prefix: Prefix,
    /// Dispatcher behavior.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    /// Cooldown map sizing.
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    /// Event intake sizing.
    #[serde(default)]
    pub intake: IntakeConfig,
}

impl FrameworkConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: FrameworkConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Newtype so the prefix default survives `#[serde(default)]` at the top level.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Prefix(pub String);

impl Default for Prefix {
    fn default() -> Self {
        Prefix(";".to_string())
    }
}

/// Dispatcher behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Whether the dispatcher processes events at all. Off until the host
    /// finishes registration, mirroring a staged boot.
    #[serde(default)]
    pub enabled: bool,
    /// Default ephemeral state applied to replies before command execution.
    #[serde(default)]
    pub default_ephemeral: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_ephemeral: false,
        }
    }
}

/// Cooldown map sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    /// Maximum tracked actors per command before eviction.
    #[serde(default = "default_cooldown_capacity")]
    pub capacity: usize,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            capacity: default_cooldown_capacity(),
        }
    }
}

fn default_cooldown_capacity() -> usize {
    1000
}

/// Event intake sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    /// Bounded intake channel size; backpressure against event storms.
    #[serde(default = "default_intake_size")]
    pub channel_size: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            channel_size: default_intake_size(),
        }
    }
}

fn default_intake_size() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FrameworkConfig::default();
        assert_eq!(config.prefix.0, ";");
        assert!(!config.dispatcher.enabled);
        assert!(!config.dispatcher.default_ephemeral);
        assert_eq!(config.cooldowns.capacity, 1000);
        assert_eq!(config.intake.channel_size, 1024);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: FrameworkConfig = toml::from_str(
            r#"
            prefix = "!"

            [dispatcher]
            enabled = true
            "#,
        )
        .expect("parse");
        assert_eq!(config.prefix.0, "!");
        assert!(config.dispatcher.enabled);
        assert!(!config.dispatcher.default_ephemeral);
        assert_eq!(config.cooldowns.capacity, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[cooldowns]\ncapacity = 64").expect("write");
        let config = FrameworkConfig::load(file.path()).expect("load");
        assert_eq!(config.cooldowns.capacity, 64);
        assert_eq!(config.prefix.0, ";");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "prefix = [").expect("write");
        assert!(matches!(
            FrameworkConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
