//! Locate ffmpeg and ffprobe

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Settings;

#[cfg(target_os = "windows")]
const FFMPEG_NAME: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const FFMPEG_NAME: &str = "ffmpeg";

#[cfg(target_os = "windows")]
const FFPROBE_NAME: &str = "ffprobe.exe";
#[cfg(not(target_os = "windows"))]
const FFPROBE_NAME: &str = "ffprobe";

/// ffmpeg detector
pub struct FfmpegDetector;

/// Detected ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegInfo {
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
    /// ffprobe next to it, if any
    pub ffprobe_path: Option<PathBuf>,
    /// Version string
    pub version: String,
    pub major_version: u32,
    pub minor_version: u32,
    /// Built with libsvtav1
    pub has_svtav1: bool,
    /// Built with libopus
    pub has_opus: bool,
}

/// Programs used for probing and encoding
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FfmpegDetector {
    /// Resolve the programs to run. Falls back to the bare names on `PATH`.
    pub fn resolve(settings: &Settings) -> ToolPaths {
        let detected = match &settings.ffmpeg_custom_path {
            Some(path) => Self::check_ffmpeg_at_path(path),
            None => Self::detect(),
        };

        let (ffmpeg, sibling_probe) = match detected {
            Ok(info) => {
                info!(
                    "Found ffmpeg {} ({}.{}) at {:?}",
                    info.version, info.major_version, info.minor_version, info.ffmpeg_path
                );
                if !info.has_svtav1 {
                    warn!("ffmpeg was not built with libsvtav1, encodes will fail");
                }
                if !info.has_opus {
                    warn!("ffmpeg was not built with libopus, encodes will fail");
                }
                (info.ffmpeg_path, info.ffprobe_path)
            }
            Err(e) => {
                warn!("ffmpeg not found: {:#}", e);
                (
                    settings
                        .ffmpeg_custom_path
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(FFMPEG_NAME)),
                    None,
                )
            }
        };

        let ffprobe = settings
            .ffprobe_custom_path
            .clone()
            .or(sibling_probe)
            .unwrap_or_else(|| PathBuf::from(FFPROBE_NAME));
        debug!("Using ffprobe {:?}", ffprobe);

        ToolPaths { ffmpeg, ffprobe }
    }

    /// Find ffmpeg on this system
    pub fn detect() -> Result<FfmpegInfo> {
        // 1. FFMPEG_DIR at run time
        if let Ok(ffmpeg_dir) = std::env::var("FFMPEG_DIR") {
            debug!("Checking FFMPEG_DIR: {}", ffmpeg_dir);
            if let Ok(info) = Self::check_ffmpeg_in_dir(Path::new(&ffmpeg_dir)) {
                return Ok(info);
            }
        }

        // 2. Path baked in at build time
        if let Some(bin_path) = option_env!("FFMPEG_BIN_PATH") {
            debug!("Checking FFMPEG_BIN_PATH: {}", bin_path);
            if let Ok(info) = Self::check_ffmpeg_in_dir(Path::new(bin_path)) {
                return Ok(info);
            }
        }

        // 3. PATH
        Self::check_ffmpeg_in_path()
    }

    /// Check a specific ffmpeg executable
    pub fn check_ffmpeg_at_path(path: &Path) -> Result<FfmpegInfo> {
        Self::get_ffmpeg_info(path)
    }

    fn check_ffmpeg_in_dir(dir: &Path) -> Result<FfmpegInfo> {
        let ffmpeg_path = dir.join(FFMPEG_NAME);
        if ffmpeg_path.exists() {
            return Self::get_ffmpeg_info(&ffmpeg_path);
        }

        let bin_path = dir.join("bin").join(FFMPEG_NAME);
        if bin_path.exists() {
            Self::get_ffmpeg_info(&bin_path)
        } else {
            Err(anyhow!("ffmpeg not found in {:?}", dir))
        }
    }

    fn check_ffmpeg_in_path() -> Result<FfmpegInfo> {
        let output = Command::new(FFMPEG_NAME)
            .arg("-version")
            .output()
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            return Err(anyhow!("ffmpeg not found in PATH"));
        }

        #[cfg(target_os = "windows")]
        let path_output = Command::new("where").arg("ffmpeg").output()?;
        #[cfg(not(target_os = "windows"))]
        let path_output = Command::new("which").arg("ffmpeg").output()?;

        let path_str = String::from_utf8_lossy(&path_output.stdout);
        let ffmpeg_path = PathBuf::from(path_str.lines().next().unwrap_or(FFMPEG_NAME).trim());

        Self::parse_ffmpeg_output(&output.stdout, ffmpeg_path)
    }

    fn get_ffmpeg_info(ffmpeg_path: &Path) -> Result<FfmpegInfo> {
        let output = Command::new(ffmpeg_path)
            .arg("-version")
            .output()
            .with_context(|| format!("Failed to execute {:?}", ffmpeg_path))?;

        if output.status.success() {
            Self::parse_ffmpeg_output(&output.stdout, ffmpeg_path.to_path_buf())
        } else {
            Err(anyhow!("ffmpeg execution failed: {:?}", ffmpeg_path))
        }
    }

    /// Parse `ffmpeg -version` output
    fn parse_ffmpeg_output(output: &[u8], ffmpeg_path: PathBuf) -> Result<FfmpegInfo> {
        let output_str = String::from_utf8_lossy(output);

        // e.g. "ffmpeg version 7.0.1 Copyright ..."
        let version_line = output_str.lines().next().context("Empty ffmpeg output")?;

        let version = version_line
            .split_whitespace()
            .find(|s| s.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false))
            .unwrap_or("unknown")
            .to_string();

        let mut version_parts = version.split(|c: char| c == '.' || c == '-');
        let major_version = version_parts
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let minor_version = version_parts
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let has_svtav1 = output_str.contains("--enable-libsvtav1");
        let has_opus = output_str.contains("--enable-libopus");

        let ffprobe_path = ffmpeg_path
            .parent()
            .map(|p| p.join(FFPROBE_NAME))
            .filter(|p| p.exists());

        Ok(FfmpegInfo {
            ffmpeg_path,
            ffprobe_path,
            version,
            major_version,
            minor_version,
            has_svtav1,
            has_opus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION_OUTPUT: &str = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers\n\
        built with gcc 13 (Ubuntu 13.2.0-23ubuntu3)\n\
        configuration: --prefix=/usr --enable-gpl --enable-libopus --enable-libsvtav1\n";

    #[test]
    fn test_parse_version_output() {
        let info = FfmpegDetector::parse_ffmpeg_output(
            VERSION_OUTPUT.as_bytes(),
            PathBuf::from("/nonexistent/bin/ffmpeg"),
        )
        .unwrap();
        assert_eq!(info.version, "6.1.1-3ubuntu5");
        assert_eq!(info.major_version, 6);
        assert_eq!(info.minor_version, 1);
        assert!(info.has_svtav1);
        assert!(info.has_opus);
        assert_eq!(info.ffprobe_path, None);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(FfmpegDetector::parse_ffmpeg_output(b"", PathBuf::from("ffmpeg")).is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_custom_paths() {
        let settings = Settings {
            ffmpeg_custom_path: Some(PathBuf::from("/nonexistent/ffmpeg")),
            ffprobe_custom_path: Some(PathBuf::from("/nonexistent/ffprobe")),
            ..Settings::default()
        };
        let tools = FfmpegDetector::resolve(&settings);
        assert_eq!(tools.ffmpeg, PathBuf::from("/nonexistent/ffmpeg"));
        assert_eq!(tools.ffprobe, PathBuf::from("/nonexistent/ffprobe"));
    }

    #[test]
    fn test_detect_ffmpeg() {
        // Only meaningful where ffmpeg is installed
        if let Ok(info) = FfmpegDetector::detect() {
            assert!(!info.version.is_empty());
        }
    }
}
