//! Stream metadata via ffprobe

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Metadata read from the first video and audio streams
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MediaMetadata {
    pub width: u32,
    pub height: u32,
    /// Frames per second, rounded to two decimals
    pub frame_rate: f64,
    pub audio_sample_rate_khz: f64,
}

impl MediaMetadata {
    /// Fallback used whenever probing fails
    pub fn zeroed() -> Self {
        Self::default()
    }
}

#[derive(Deserialize, Debug)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize, Debug)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    sample_rate: Option<serde_json::Value>,
}

/// ffprobe wrapper
#[derive(Clone, Debug)]
pub struct MediaProbe {
    program: PathBuf,
}

impl MediaProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Probe `path`. Never fails: any error yields zeroed metadata.
    pub fn probe(&self, path: &Path) -> MediaMetadata {
        match self.try_probe(path) {
            Ok(metadata) => {
                debug!("Probed {:?}: {:?}", path, metadata);
                metadata
            }
            Err(e) => {
                warn!("Failed to probe {:?}: {:#}", path, e);
                MediaMetadata::zeroed()
            }
        }
    }

    fn try_probe(&self, path: &Path) -> Result<MediaMetadata> {
        debug!("Running {:?} on {:?}", self.program, path);
        let output = Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {:?}", self.program))?;

        if !output.status.success() {
            bail!("{:?} exited with {}", self.program, output.status);
        }

        parse_probe_output(&output.stdout)
    }
}

/// Parse ffprobe JSON: stream 0 is video, stream 1 is audio
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaMetadata> {
    let parsed: FfprobeOutput =
        serde_json::from_slice(stdout).context("ffprobe output is not valid JSON")?;

    let video = parsed.streams.first().context("No video stream")?;
    let audio = parsed.streams.get(1).context("No audio stream")?;

    let width = video.width.context("Video stream has no width")?;
    let height = video.height.context("Video stream has no height")?;
    let frame_rate = parse_frame_rate(
        video
            .r_frame_rate
            .as_deref()
            .context("Video stream has no r_frame_rate")?,
    )?;
    let sample_rate_hz = parse_sample_rate(
        audio
            .sample_rate
            .as_ref()
            .context("Audio stream has no sample_rate")?,
    )?;

    Ok(MediaMetadata {
        width,
        height,
        frame_rate,
        audio_sample_rate_khz: sample_rate_hz / 1000.0,
    })
}

/// Parse `"num/den"` or a plain number, rounded to two decimals
pub fn parse_frame_rate(value: &str) -> Result<f64> {
    let value = value.trim();
    let fps = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num
                .trim()
                .parse()
                .with_context(|| format!("Numerator of {:?} is not a number", value))?;
            let den: f64 = den
                .trim()
                .parse()
                .with_context(|| format!("Denominator of {:?} is not a number", value))?;
            if den == 0.0 {
                bail!("Frame rate {:?} has a zero denominator", value);
            }
            num / den
        }
        None => value
            .parse()
            .with_context(|| format!("Frame rate {:?} is not a number", value))?,
    };

    if !fps.is_finite() {
        bail!("Frame rate {:?} is not finite", value);
    }

    Ok((fps * 100.0).round() / 100.0)
}

// ffprobe reports sample_rate as a string, but accept numbers too
fn parse_sample_rate(value: &serde_json::Value) -> Result<f64> {
    match value {
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .with_context(|| format!("sample_rate {:?} is not a number", s)),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow!("sample_rate {} is out of range", n)),
        other => bail!("Unexpected sample_rate {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001"},
            {"index": 1, "codec_type": "audio", "sample_rate": "48000", "channels": 2}
        ],
        "format": {"filename": "in.mp4"}
    }"#;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30000/1001").unwrap(), 29.97);
        assert_eq!(parse_frame_rate("25/1").unwrap(), 25.0);
        assert_eq!(parse_frame_rate("24").unwrap(), 24.0);
        assert!(parse_frame_rate("0/0").is_err());
        assert!(parse_frame_rate("abc/1").is_err());
    }

    #[test]
    fn test_parse_probe_output() {
        let metadata = parse_probe_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(metadata.width, 1920);
        assert_eq!(metadata.height, 1080);
        assert_eq!(metadata.frame_rate, 29.97);
        assert_eq!(metadata.audio_sample_rate_khz, 48.0);
    }

    #[test]
    fn test_parse_numeric_sample_rate() {
        let json = r#"{"streams": [
            {"width": 640, "height": 360, "r_frame_rate": "25/1"},
            {"sample_rate": 44100}
        ]}"#;
        let metadata = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(metadata.audio_sample_rate_khz, 44.1);
    }

    #[test]
    fn test_parse_missing_audio_stream() {
        let json = r#"{"streams": [{"width": 640, "height": 360, "r_frame_rate": "25/1"}]}"#;
        assert!(parse_probe_output(json.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_probe_output(b"not json").is_err());
        assert!(parse_probe_output(b"{}").is_err());
    }

    #[test]
    fn test_probe_malformed_output_is_zeroed() {
        // echo prints its arguments, which is not JSON
        let probe = MediaProbe::new("echo");
        assert_eq!(probe.probe(Path::new("in.mp4")), MediaMetadata::zeroed());
    }

    #[test]
    fn test_probe_missing_program_is_zeroed() {
        let probe = MediaProbe::new("/nonexistent/aviator-ffprobe");
        assert_eq!(probe.probe(Path::new("in.mp4")), MediaMetadata::zeroed());
    }
}
