use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::motors::{self, StageMotor};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration file: {source}")]
    ReadError { source: std::io::Error },

    #[error("Failed to parse configuration: {source}")]
    ParseError { source: toml::de::Error },

    #[error("Failed to serialize configuration: {source}")]
    SerializeError { source: toml::ser::Error },

    #[error("Failed to write configuration file: {source}")]
    WriteError { source: std::io::Error },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Alternative monitoring policy: every motion command also adds its
    /// axis to the monitored set. The add/remove mutators stay authoritative
    /// either way.
    pub auto_monitor_on_move: bool,

    /// Poll period used when a client starts monitoring without one.
    pub default_monitor_period_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_monitor_on_move: false,
            default_monitor_period_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    pub socket_path: String,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/stage_controller.sock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub socket: SocketConfig,

    /// Stage motor catalog, loaded once and never mutated afterwards.
    #[serde(default = "motors::default_catalog")]
    pub motors: Vec<StageMotor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            socket: SocketConfig::default(),
            motors: motors::default_catalog(),
        }
    }
}

#[derive(Debug)]
pub struct ConfigOptions {
    pub config_path: PathBuf,
    pub create_if_missing: bool,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            create_if_missing: true,
        }
    }
}

impl ConfigOptions {
    pub fn default_config_path() -> PathBuf {
        std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("default_config.toml"))
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfigManager {
    options: ConfigOptions,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            options: ConfigOptions::default(),
        }
    }

    pub fn with_options(options: ConfigOptions) -> Self {
        Self { options }
    }

    pub fn load(&self) -> anyhow::Result<Config> {
        let config_path = self.options.config_path.clone();

        if !config_path.exists() {
            if self.options.create_if_missing {
                let default_config = Config::default();
                self.save(&default_config)
                    .context("Failed to save default config")?;
                return Ok(default_config);
            } else {
                return Err(ConfigError::FileNotFound { path: config_path }.into());
            }
        }

        let content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError { source: e })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError { source: e })?;

        Ok(config)
    }

    pub fn save(&self, config: &Config) -> anyhow::Result<()> {
        let config_path = &self.options.config_path;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError { source: e })?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(config_path, content).map_err(|e| ConfigError::WriteError { source: e })?;

        Ok(())
    }
}

pub fn init_config() -> anyhow::Result<(ConfigManager, Config)> {
    let manager = ConfigManager::new();
    let config = manager.load()?;
    Ok((manager, config))
}

pub fn init_config_with_options(options: ConfigOptions) -> anyhow::Result<(ConfigManager, Config)> {
    let manager = ConfigManager::with_options(options);
    let config = manager.load()?;
    Ok((manager, config))
}

pub fn create_default_config<P: AsRef<Path>>(path: Option<P>) -> anyhow::Result<()> {
    let config_path = path
        .map(|p| p.as_ref().to_path_buf())
        .unwrap_or_else(ConfigOptions::default_config_path);

    let options = ConfigOptions {
        config_path,
        create_if_missing: true,
    };

    let manager = ConfigManager::with_options(options);
    let default_config = Config::default();
    manager.save(&default_config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let manager = ConfigManager::with_options(ConfigOptions::with_path(&path));

        let mut config = Config::default();
        config.engine.auto_monitor_on_move = true;
        config.engine.default_monitor_period_ms = 250;
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert!(loaded.engine.auto_monitor_on_move);
        assert_eq!(loaded.engine.default_monitor_period_ms, 250);
        assert_eq!(loaded.motors, motors::default_catalog());
    }

    #[test]
    fn load_creates_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let manager = ConfigManager::with_options(ConfigOptions::with_path(&path));
        let config = manager.load().unwrap();

        assert!(path.exists());
        assert!(!config.engine.auto_monitor_on_move);
    }

    #[test]
    fn missing_file_is_an_error_when_creation_disabled() {
        let dir = tempfile::tempdir().unwrap();

        let manager = ConfigManager::with_options(ConfigOptions {
            config_path: dir.path().join("absent.toml"),
            create_if_missing: false,
        });

        assert!(manager.load().is_err());
    }
}
