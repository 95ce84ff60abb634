//! Host settings with persistence
//!
//! Settings are saved to `~/.config/vantage/settings.toml`; `VANTAGE_LOG`
//! overrides the configured log level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use vantage_camera::EngineConfig;

/// All host settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub log: LogSettings,
    pub demo: DemoSettings,
    pub storage: StorageSettings,
    pub engine: EngineConfig,
}

/// Environment variable that overrides `log.level`
pub const LOG_ENV: &str = "VANTAGE_LOG";

/// How the settings were obtained.
///
/// Settings are read before the subscriber exists, so the outcome is kept
/// and logged once tracing is up.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsOrigin {
    File(PathBuf),
    Missing(PathBuf),
    Invalid { path: PathBuf, reason: String },
    NoConfigDir,
}

impl SettingsOrigin {
    pub fn log(&self) {
        match self {
            SettingsOrigin::File(path) => info!("Loaded settings from {:?}", path),
            SettingsOrigin::Missing(path) => {
                info!("No settings at {:?}, using defaults", path)
            }
            SettingsOrigin::Invalid { path, reason } => {
                warn!("Ignoring settings at {:?}: {}, using defaults", path, reason)
            }
            SettingsOrigin::NoConfigDir => warn!("Could not determine config directory"),
        }
    }
}

impl HostSettings {
    /// `~/.config/vantage/settings.toml`, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vantage").join("settings.toml"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> (Self, SettingsOrigin) {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => (Self::default(), SettingsOrigin::NoConfigDir),
        }
    }

    pub fn load_from(path: &Path) -> (Self, SettingsOrigin) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return (Self::default(), SettingsOrigin::Missing(path.to_path_buf()));
            }
            Err(e) => return (Self::default(), Self::invalid(path, e.to_string())),
        };
        match toml::from_str(&content) {
            Ok(settings) => (settings, SettingsOrigin::File(path.to_path_buf())),
            Err(e) => (Self::default(), Self::invalid(path, e.to_string())),
        }
    }

    /// Save to the default location; returns the path written
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = Self::default_path().context("Could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {:?}", dir))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Log level for the subscriber; a valid `VANTAGE_LOG` wins over the file
    pub fn max_level(&self, env_override: Option<&str>) -> Level {
        env_override
            .and_then(|level| level.trim().parse().ok())
            .unwrap_or_else(|| self.log.max_level())
    }

    fn invalid(path: &Path, reason: String) -> SettingsOrigin {
        SettingsOrigin::Invalid {
            path: path.to_path_buf(),
            reason,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LogSettings {
    /// Parsed level, falling back to INFO
    pub fn max_level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

/// Headless demo run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Number of frames to simulate
    pub frames: u32,
    /// Simulated refresh rate in Hz
    pub frame_rate: f32,
    /// Motion generator to run, e.g. "orbit"
    pub motion: String,
    /// Projection mode to switch to halfway through, if any
    pub projection: Option<String>,
    /// Points logged from the motion preview
    pub preview_samples: usize,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            frames: 600,
            frame_rate: 60.0,
            motion: "orbit".to_string(),
            projection: Some("sphere".to_string()),
            preview_samples: 4,
        }
    }
}

impl DemoSettings {
    /// Seconds per simulated frame
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.frame_rate.max(1.0)
    }
}

/// Where bookmarks and motion presets are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Write to the user data directory instead of memory
    pub persist: bool,
    /// Overrides the data directory
    pub data_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: HostSettings = toml::from_str(
            r#"
            [demo]
            frames = 10

            [engine.animator]
            additive_factor = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(settings.demo.frames, 10);
        assert_eq!(settings.demo.frame_rate, 60.0);
        assert_eq!(settings.engine.animator.additive_factor, 0.5);
        assert_eq!(settings.engine.animator.motion_resume_delay_ms, 1500.0);
        assert_eq!(settings.log.max_level(), Level::INFO);
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = HostSettings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: HostSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.demo.motion, "orbit");
        assert_eq!(parsed.engine.camera.history_limit, 100);
    }

    #[test]
    fn test_bad_level_falls_back() {
        let log = LogSettings {
            level: "loud".to_string(),
        };
        assert_eq!(log.max_level(), Level::INFO);
    }

    #[test]
    fn test_env_level_overrides_file() {
        let mut settings = HostSettings::default();
        settings.log.level = "warn".to_string();
        assert_eq!(settings.max_level(None), Level::WARN);
        assert_eq!(settings.max_level(Some("DEBUG")), Level::DEBUG);
        assert_eq!(settings.max_level(Some("nonsense")), Level::WARN);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("vantage-settings-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = scratch_dir("missing").join("settings.toml");
        let (settings, origin) = HostSettings::load_from(&path);
        assert_eq!(origin, SettingsOrigin::Missing(path));
        assert_eq!(settings.demo.frames, 600);
    }

    #[test]
    fn test_save_then_load_from_path() {
        let dir = scratch_dir("round-trip");
        let path = dir.join("nested").join("settings.toml");
        let mut settings = HostSettings::default();
        settings.demo.motion = "spiral".to_string();
        settings.log.level = "debug".to_string();
        settings.save_to(&path).unwrap();

        let (loaded, origin) = HostSettings::load_from(&path);
        assert_eq!(origin, SettingsOrigin::File(path.clone()));
        assert_eq!(loaded.demo.motion, "spiral");
        assert_eq!(loaded.max_level(None), Level::DEBUG);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unparseable_file_reports_reason() {
        let dir = scratch_dir("invalid");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(&path, "[demo\nframes = ").unwrap();

        let (settings, origin) = HostSettings::load_from(&path);
        assert!(matches!(origin, SettingsOrigin::Invalid { path: ref p, .. } if *p == path));
        assert_eq!(settings.demo.motion, "orbit");
        let _ = fs::remove_dir_all(&dir);
    }
}
