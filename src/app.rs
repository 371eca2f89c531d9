//! Application context

use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{first_open, Settings};
use crate::ffmpeg::{FfmpegDetector, ToolPaths};
use crate::notify::{DesktopNotifier, LogNotifier, Notifier};
use crate::transcoder::{EncodeRunner, MediaProbe};
use crate::ui::MainWindow;

/// Everything the UI shell needs, created once in `main`
pub struct AppContext {
    /// Settings
    pub settings: Settings,
    /// Probe used for "same as source" defaults
    pub probe: MediaProbe,
    /// Encoder launcher
    pub runner: EncodeRunner,
    /// Completion notifications
    pub notifier: Arc<dyn Notifier>,
    /// First-run marker, if the config directory is usable
    startup_marker: Option<PathBuf>,
}

impl AppContext {
    /// Detect tools and build the context
    pub fn init(settings: Settings) -> Self {
        let ToolPaths { ffmpeg, ffprobe } = FfmpegDetector::resolve(&settings);

        let notifier: Arc<dyn Notifier> = if settings.desktop_notifications {
            Arc::new(DesktopNotifier::default())
        } else {
            info!("Desktop notifications disabled");
            Arc::new(LogNotifier)
        };

        let startup_marker = match settings.startup_marker_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Onboarding state unavailable: {:#}", e);
                None
            }
        };

        Self::from_parts(
            settings,
            MediaProbe::new(ffprobe),
            EncodeRunner::new(ffmpeg),
            notifier,
            startup_marker,
        )
    }

    /// Build a context from explicit parts
    pub fn from_parts(
        settings: Settings,
        probe: MediaProbe,
        runner: EncodeRunner,
        notifier: Arc<dyn Notifier>,
        startup_marker: Option<PathBuf>,
    ) -> Self {
        Self {
            settings,
            probe,
            runner,
            notifier,
            startup_marker,
        }
    }

    /// Whether onboarding should be shown. Creates the marker on first call.
    pub fn first_open(&self) -> bool {
        let Some(marker) = &self.startup_marker else {
            return false;
        };

        match first_open(marker) {
            Ok(first) => first,
            Err(e) => {
                warn!("{:#}", e);
                false
            }
        }
    }

    /// Wait for an in-flight export, then shut down. The encoder is never killed.
    pub async fn teardown(&self, window: &mut MainWindow) {
        if window.is_encoding() {
            info!("Waiting for the running export to finish...");
            window.wait_for_export(self).await;
        }
        info!("Shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use tempfile::tempdir;

    #[test]
    fn test_first_open_once() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("aviator").join("startup.dat");
        let ctx = AppContext::from_parts(
            Settings::default(),
            MediaProbe::new("echo"),
            EncodeRunner::new("true"),
            Arc::new(RecordingNotifier::default()),
            Some(marker.clone()),
        );

        assert!(ctx.first_open());
        assert!(!ctx.first_open());
        assert!(marker.exists());
    }

    #[test]
    fn test_first_open_without_marker() {
        let ctx = AppContext::from_parts(
            Settings::default(),
            MediaProbe::new("echo"),
            EncodeRunner::new("true"),
            Arc::new(RecordingNotifier::default()),
            None,
        );
        assert!(!ctx.first_open());
    }

    #[tokio::test]
    async fn test_teardown_waits_for_export() {
        let notifier = RecordingNotifier::default();
        let ctx = AppContext::from_parts(
            Settings::default(),
            MediaProbe::new("echo"),
            EncodeRunner::new("true"),
            Arc::new(notifier.clone()),
            None,
        );
        let mut window = MainWindow::new(&ctx.settings);
        window.open_source_file(&ctx, "/videos/in.mp4");
        window.set_resolution(1280, 720).unwrap();
        window.set_framerate(30).unwrap();
        window.set_bitrate(128).unwrap();
        window.open_output_file("/videos/out");
        window.start_export(&ctx);
        assert!(window.is_encoding());

        ctx.teardown(&mut window).await;

        assert!(!window.is_encoding());
        assert_eq!(notifier.bodies().len(), 1);
    }
}
