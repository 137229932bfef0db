use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// When the registry re-validates itself after a committed edit.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyChecks {
    Off,
    /// Only in builds with debug assertions.
    #[default]
    Debug,
    Always,
}

impl ConsistencyChecks {
    pub fn enabled(self) -> bool {
        match self {
            ConsistencyChecks::Off => false,
            ConsistencyChecks::Debug => cfg!(debug_assertions),
            ConsistencyChecks::Always => true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct TimelineConfig {
    /// Used when reporting durations in seconds.
    pub fps: f64,
    /// Resize mode given to newly constructed clips.
    pub endless_resize: bool,
    pub consistency_checks: ConsistencyChecks,
    /// Maximum undo entries kept, 0 for unlimited.
    pub undo_limit: usize,
    pub log_level: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            fps: 25.0,
            endless_resize: false,
            consistency_checks: ConsistencyChecks::default(),
            undo_limit: 100,
            log_level: "info".to_string(),
        }
    }
}

impl TimelineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, LibraryError> {
        let config: TimelineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let toml_str = fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str)
    }

    /// Like [`TimelineConfig::load`], but a missing file is `Ok(None)`.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, LibraryError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Read `config.toml` from the platform config directory, falling back
    /// to defaults when it is missing or broken.
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        Self::or_default(&path, Self::load_optional(&path))
    }

    /// Resolve a load result, logging where the config came from or why it
    /// was ignored. Call this once a logger is installed.
    pub fn or_default(path: &Path, loaded: Result<Option<Self>, LibraryError>) -> Self {
        match loaded {
            Ok(Some(config)) => {
                info!("Loaded timeline config from {}", path.display());
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Failed to load config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, LibraryError> {
        toml::to_string_pretty(self)
            .map_err(|e| LibraryError::InvalidArgument(format!("Cannot serialize config: {}", e)))
    }

    fn validate(&self) -> Result<(), LibraryError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(LibraryError::InvalidArgument(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Frame count expressed in seconds at the configured rate.
    pub fn frames_to_seconds(&self, frames: i64) -> f64 {
        frames as f64 / self.fps
    }
}

pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "clip-timeline", "clip_timeline")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = TimelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, TimelineConfig::default());
        assert_eq!(config.undo_limit, 100);
        assert_eq!(config.consistency_checks, ConsistencyChecks::Debug);
    }

    #[test]
    fn test_partial_override() {
        let config = TimelineConfig::from_toml_str(
            r#"
            fps = 30.0
            consistency_checks = "always"
            undo_limit = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.fps, 30.0);
        assert_eq!(config.consistency_checks, ConsistencyChecks::Always);
        assert_eq!(config.undo_limit, 5);
        assert!(!config.endless_resize);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            TimelineConfig::from_toml_str("fps = 0.0"),
            Err(LibraryError::InvalidArgument(_))
        ));
        assert!(matches!(
            TimelineConfig::from_toml_str("undo_limit = \"many\""),
            Err(LibraryError::Config(_))
        ));
    }

    #[test]
    fn test_toml_output_reloads() {
        let mut config = TimelineConfig::default();
        config.endless_resize = true;
        let text = config.to_toml_string().unwrap();
        assert_eq!(TimelineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_optional_reports_to_caller() {
        let dir = std::env::temp_dir().join(format!("clip-timeline-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        assert!(TimelineConfig::load_optional(&path).unwrap().is_none());

        fs::write(&path, "fps = \"fast\"").unwrap();
        let loaded = TimelineConfig::load_optional(&path);
        assert!(matches!(loaded, Err(LibraryError::Config(_))));
        assert_eq!(TimelineConfig::or_default(&path, loaded), TimelineConfig::default());

        fs::write(&path, "log_level = \"debug\"").unwrap();
        let loaded = TimelineConfig::load_optional(&path).unwrap().unwrap();
        assert_eq!(loaded.log_level, "debug");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_frames_to_seconds() {
        let config = TimelineConfig::default();
        assert_eq!(config.frames_to_seconds(50), 2.0);
    }

    #[test]
    fn test_checks_toggle() {
        assert!(!ConsistencyChecks::Off.enabled());
        assert!(ConsistencyChecks::Always.enabled());
    }
}
