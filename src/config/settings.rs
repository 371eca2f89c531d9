//! Application settings (defaults plus environment overrides)

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::transcoder::Container;

/// Name of the per-user config subdirectory
const APP_DIR_NAME: &str = "aviator";

/// First-run marker file name
const STARTUP_MARKER: &str = "startup.dat";

/// Application settings
#[derive(Clone, Debug)]
pub struct Settings {
    /// Explicit ffmpeg path (`AVIATOR_FFMPEG`)
    pub ffmpeg_custom_path: Option<PathBuf>,
    /// Explicit ffprobe path (`AVIATOR_FFPROBE`)
    pub ffprobe_custom_path: Option<PathBuf>,
    /// Config directory override (`AVIATOR_CONFIG_DIR`)
    pub config_dir_override: Option<PathBuf>,
    /// Send desktop notifications (`AVIATOR_NOTIFY`)
    pub desktop_notifications: bool,
    /// Initial CRF slider value
    pub default_crf: u8,
    /// Initial preset slider value
    pub default_preset: u8,
    /// Initially selected container
    pub default_container: Container,
    /// Initial VBR switch state
    pub default_vbr: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_custom_path: None,
            ffprobe_custom_path: None,
            config_dir_override: None,
            desktop_notifications: true,
            default_crf: 32,
            default_preset: 6,
            default_container: Container::Mkv,
            default_vbr: true,
        }
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("AVIATOR_FFMPEG") {
            settings.ffmpeg_custom_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty("AVIATOR_FFPROBE") {
            settings.ffprobe_custom_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = non_empty("AVIATOR_CONFIG_DIR") {
            settings.config_dir_override = Some(PathBuf::from(dir));
        }
        if let Some(flag) = non_empty("AVIATOR_NOTIFY") {
            settings.desktop_notifications =
                !matches!(flag.trim().to_lowercase().as_str(), "0" | "off" | "false" | "no");
        }

        debug!("Settings: {:?}", settings);
        settings
    }

    /// Per-user config directory, created if missing
    pub fn config_dir(&self) -> Result<PathBuf> {
        let config_dir = match &self.config_dir_override {
            Some(dir) => dir.clone(),
            None => dirs::config_dir()
                .context("Failed to get config directory")?
                .join(APP_DIR_NAME),
        };

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create {:?}", config_dir))?;
        }

        Ok(config_dir)
    }

    /// Path of the first-run marker
    pub fn startup_marker_path(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(STARTUP_MARKER))
    }
}

/// Returns `true` exactly once per marker path, creating the marker.
pub fn first_open(marker: &Path) -> Result<bool> {
    if marker.exists() {
        return Ok(false);
    }

    if let Some(parent) = marker.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    std::fs::write(marker, "\n")
        .with_context(|| format!("Failed to write startup marker {:?}", marker))?;
    info!("First run, created {:?}", marker);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_window() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.default_crf, 32);
        assert_eq!(settings.default_preset, 6);
        assert_eq!(settings.default_container, Container::Mkv);
        assert!(settings.default_vbr);
        assert!(settings.desktop_notifications);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("AVIATOR_FFMPEG", "/opt/ff/ffmpeg"),
            ("AVIATOR_FFPROBE", ""),
            ("AVIATOR_NOTIFY", "off"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(settings.ffmpeg_custom_path, Some(PathBuf::from("/opt/ff/ffmpeg")));
        assert_eq!(settings.ffprobe_custom_path, None);
        assert!(!settings.desktop_notifications);
    }

    #[test]
    fn test_first_open_only_once() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("nested").join(STARTUP_MARKER);

        assert!(first_open(&marker).unwrap());
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "\n");
        assert!(!first_open(&marker).unwrap());
        assert!(!first_open(&marker).unwrap());
    }

    #[test]
    fn test_config_dir_override_is_created() {
        let root = tempdir().unwrap();
        let dir = root.path().join("aviator");
        let settings = Settings {
            config_dir_override: Some(dir.clone()),
            ..Settings::default()
        };

        assert_eq!(
            settings.startup_marker_path().unwrap(),
            dir.join(STARTUP_MARKER)
        );
        assert!(dir.is_dir());
    }
}
