//! Encode job description

use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Video encoder
pub const VIDEO_ENCODER: &str = "libsvtav1";
/// Audio encoder
pub const AUDIO_ENCODER: &str = "libopus";
/// Highest SVT-AV1 CRF
pub const MAX_CRF: u8 = 63;
/// Slowest SVT-AV1 preset
pub const MAX_PRESET: u8 = 13;

/// Output container
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Container {
    Mkv,
    Webm,
}

impl Container {
    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mkv => "mkv",
            Container::Webm => "webm",
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Container::Mkv => "MKV",
            Container::Webm => "WEBM",
        }
    }

    /// Append the canonical extension unless `output` already ends with it
    pub fn normalize_output(&self, output: &str) -> PathBuf {
        let suffix = format!(".{}", self.extension());
        if output.ends_with(&suffix) {
            PathBuf::from(output)
        } else {
            PathBuf::from(format!("{}{}", output, suffix))
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One encode request. Built once per export and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobSpec {
    pub source_path: String,
    pub output_path: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub crf: u8,
    pub preset: u8,
    pub audio_bitrate_kbps: u32,
    pub vbr: bool,
    pub container: Container,
}

impl JobSpec {
    /// Check the invariants that must hold before the encoder is launched
    pub fn validate(&self) -> Result<()> {
        if self.source_path.trim().is_empty() {
            bail!("No source file selected");
        }
        if self.output_path.trim().is_empty() {
            bail!("No output file selected");
        }
        if self.width == 0 || self.height == 0 {
            bail!("Resolution must be positive, got {}x{}", self.width, self.height);
        }
        if self.frame_rate == 0 {
            bail!("Framerate must be positive");
        }
        if self.audio_bitrate_kbps == 0 {
            bail!("Audio bitrate must be positive");
        }
        if self.crf > MAX_CRF {
            bail!("CRF {} is out of range (0-{})", self.crf, MAX_CRF);
        }
        if self.preset > MAX_PRESET {
            bail!("Preset {} is out of range (0-{})", self.preset, MAX_PRESET);
        }
        Ok(())
    }

    /// Output path with the container extension applied
    pub fn resolved_output(&self) -> PathBuf {
        self.container.normalize_output(&self.output_path)
    }

    /// Build the ffmpeg argument list
    pub fn build_ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Never read from the terminal
        args.push("-nostdin".to_string());
        // stderr is buffered until exit, keep it to warnings and errors
        args.push("-nostats".to_string());

        args.push("-i".to_string());
        args.push(self.source_path.clone());

        self.add_video_args(&mut args);
        self.add_audio_args(&mut args);

        args.push(self.resolved_output().to_string_lossy().to_string());

        args
    }

    fn add_video_args(&self, args: &mut Vec<String>) {
        args.push("-r".to_string());
        args.push(self.frame_rate.to_string());

        args.push("-vf".to_string());
        args.push(format!("scale={}:{}", self.width, self.height));

        args.push("-c:v".to_string());
        args.push(VIDEO_ENCODER.to_string());

        // Keep every input stream
        args.push("-map".to_string());
        args.push("0".to_string());

        args.push("-crf".to_string());
        args.push(self.crf.to_string());

        args.push("-preset".to_string());
        args.push(self.preset.to_string());
    }

    fn add_audio_args(&self, args: &mut Vec<String>) {
        args.push("-c:a".to_string());
        args.push(AUDIO_ENCODER.to_string());

        args.push("-b:a".to_string());
        args.push(format!("{}K", self.audio_bitrate_kbps));

        args.push("-vbr".to_string());
        args.push(if self.vbr { "on" } else { "off" }.to_string());

        args.push("-compression_level".to_string());
        args.push("10".to_string());
    }
}

#[cfg(test)]
pub(crate) fn sample_job() -> JobSpec {
    JobSpec {
        source_path: "in.mp4".to_string(),
        output_path: "out".to_string(),
        width: 1280,
        height: 720,
        frame_rate: 30,
        crf: 32,
        preset: 6,
        audio_bitrate_kbps: 128,
        vbr: true,
        container: Container::Mkv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_build_args() {
        let args = sample_job().build_ffmpeg_args();

        assert_eq!(args.first().map(String::as_str), Some("-nostdin"));
        assert!(args.iter().any(|a| a == "-nostats"));
        assert_eq!(args.last().map(String::as_str), Some("out.mkv"));
        assert!(contains_pair(&args, "-i", "in.mp4"));
        assert!(contains_pair(&args, "-r", "30"));
        assert!(contains_pair(&args, "-vf", "scale=1280:720"));
        assert!(contains_pair(&args, "-c:v", "libsvtav1"));
        assert!(contains_pair(&args, "-map", "0"));
        assert!(contains_pair(&args, "-crf", "32"));
        assert!(contains_pair(&args, "-preset", "6"));
        assert!(contains_pair(&args, "-c:a", "libopus"));
        assert!(contains_pair(&args, "-b:a", "128K"));
        assert!(contains_pair(&args, "-vbr", "on"));
        assert!(contains_pair(&args, "-compression_level", "10"));
    }

    #[test]
    fn test_vbr_off() {
        let job = JobSpec {
            vbr: false,
            ..sample_job()
        };
        assert!(contains_pair(&job.build_ffmpeg_args(), "-vbr", "off"));
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(Container::Mkv.normalize_output("out"), PathBuf::from("out.mkv"));
        assert_eq!(
            Container::Webm.normalize_output("clip.webm"),
            PathBuf::from("clip.webm")
        );
        assert_eq!(
            Container::Mkv.normalize_output("clip.webm"),
            PathBuf::from("clip.webm.mkv")
        );
    }

    #[test]
    fn test_validate() {
        assert!(sample_job().validate().is_ok());

        let zero_width = JobSpec {
            width: 0,
            ..sample_job()
        };
        assert!(zero_width.validate().is_err());

        let no_bitrate = JobSpec {
            audio_bitrate_kbps: 0,
            ..sample_job()
        };
        assert!(no_bitrate.validate().is_err());

        let bad_preset = JobSpec {
            preset: 14,
            ..sample_job()
        };
        assert!(bad_preset.validate().is_err());

        let no_output = JobSpec {
            output_path: " ".to_string(),
            ..sample_job()
        };
        assert!(no_output.validate().is_err());
    }
}
