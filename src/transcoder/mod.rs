//! Transcoder module

mod error;
pub(crate) mod job;
mod probe;
mod runner;

pub use error::FfmpegError;
pub use job::{Container, JobSpec, MAX_CRF, MAX_PRESET};
pub use probe::{MediaMetadata, MediaProbe};
pub use runner::{EncodeResult, EncodeRunner, JobState};
