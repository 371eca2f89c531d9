//! ffmpeg installation

mod detector;

pub use detector::{FfmpegDetector, ToolPaths};
