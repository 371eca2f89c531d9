//! First-run onboarding screen

use anyhow::Result;

use super::{MainWindow, Reply};
use crate::app::AppContext;

/// Welcome text shown once per user
pub const WELCOME: &str = "\
Welcome to Aviator, your video copilot.

Aviator encodes your videos to AV1 with Opus audio using ffmpeg.
Pick a source, tweak resolution, framerate, quality and audio, then export.
You will get a notification when the encode is done.

Type `go` to get started.";

pub(super) fn go(_: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    Ok(Reply::OpenMainWindow)
}
