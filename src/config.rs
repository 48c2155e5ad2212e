use crate::backend::sampler::SamplerSettings;
use crate::error::ConfigError;
use crate::model::AlertThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub refresh_interval_ms: u64,
    pub history_len: usize,
    pub disk_path: PathBuf,
    pub thresholds: AlertThresholds,
    pub app_memory_floor_mb: u64,
    pub process_limit: usize,
    pub extra_app_names: Vec<String>,
    pub scan_desktop_entries: bool,
    /// Print every sample to stdout as a JSON line.
    pub emit_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            history_len: 60,
            disk_path: PathBuf::from("/"),
            thresholds: AlertThresholds::default(),
            app_memory_floor_mb: 50,
            process_limit: 100,
            extra_app_names: Vec::new(),
            scan_desktop_entries: true,
            emit_json: false,
        }
    }
}

impl Config {
    /// Loads the user's config, falling back to defaults when it is missing
    /// or broken.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Config::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&data).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_len == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        self.thresholds.validate()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            thresholds: self.thresholds,
            disk_path: self.disk_path.clone(),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("system-monitor-linux")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"disk_path": "/home", "thresholds": {"cpu": 75}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.disk_path, PathBuf::from("/home"));
        assert_eq!(config.thresholds.cpu, 75.0);
        assert_eq!(config.thresholds.memory, 85.0);
        assert_eq!(config.refresh_interval_ms, 1000);
        assert_eq!(config.history_len, 60);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"thresholds": {"disk": 250}}"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Json { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load_from(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn zero_history_is_rejected() {
        let config = Config {
            history_len: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyHistory)));
    }
}
