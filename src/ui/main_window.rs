//! Main window state

use anyhow::{bail, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;

use super::Reply;
use crate::app::AppContext;
use crate::config::Settings;
use crate::notify::humanize;
use crate::transcoder::{
    Container, EncodeResult, JobSpec, JobState, MediaMetadata, MAX_CRF, MAX_PRESET,
};

/// Main window
///
/// Owned and mutated only by the foreground shell. An export hides the
/// encode button and shows the spinner until its result is applied by
/// [`MainWindow::finish_export`], so at most one encode is in flight.
pub struct MainWindow {
    // Video page
    source_file_label: String,
    source_file_absolute: String,
    width: u32,
    height: u32,
    frame_rate: u32,
    crf: u8,
    preset: u8,

    // Audio page
    audio_bitrate_kbps: u32,
    vbr: bool,

    // Export page
    output_file: String,
    container: Container,
    encode_button_visible: bool,
    encoding_spinner_visible: bool,

    metadata: MediaMetadata,
    job_state: JobState,
    pending: Option<oneshot::Receiver<EncodeResult>>,
    pending_output: PathBuf,
    last_result: Option<EncodeResult>,
}

impl MainWindow {
    pub fn new(settings: &Settings) -> Self {
        Self {
            source_file_label: String::new(),
            source_file_absolute: String::new(),
            width: 0,
            height: 0,
            frame_rate: 0,
            crf: settings.default_crf,
            preset: settings.default_preset,
            audio_bitrate_kbps: 0,
            vbr: settings.default_vbr,
            output_file: String::new(),
            container: settings.default_container,
            encode_button_visible: true,
            encoding_spinner_visible: false,
            metadata: MediaMetadata::zeroed(),
            job_state: JobState::Idle,
            pending: None,
            pending_output: PathBuf::new(),
            last_result: None,
        }
    }

    fn load_metadata(&mut self, ctx: &AppContext) {
        self.metadata = ctx.probe.probe(Path::new(&self.source_file_absolute));
    }

    // Video

    /// Select the source file and fill every "same as source" field
    pub fn open_source_file(&mut self, ctx: &AppContext, path: &str) {
        self.source_file_absolute = path.to_string();
        self.source_file_label = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());

        self.load_metadata(ctx);
        self.apply_resolution();
        self.apply_framerate();
        self.apply_bitrate();
    }

    pub fn resolution_same_as_source(&mut self, ctx: &AppContext) {
        self.load_metadata(ctx);
        self.apply_resolution();
    }

    pub fn framerate_same_as_source(&mut self, ctx: &AppContext) {
        self.load_metadata(ctx);
        self.apply_framerate();
    }

    pub fn bitrate_same_as_source(&mut self, ctx: &AppContext) {
        self.load_metadata(ctx);
        self.apply_bitrate();
    }

    fn apply_resolution(&mut self) {
        self.width = self.metadata.width;
        self.height = self.metadata.height;
    }

    fn apply_framerate(&mut self) {
        self.frame_rate = self.metadata.frame_rate.round() as u32;
    }

    // The bitrate field is seeded from the sample rate in kHz
    fn apply_bitrate(&mut self) {
        self.audio_bitrate_kbps = self.metadata.audio_sample_rate_khz.round() as u32;
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            bail!("Resolution must be positive");
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn set_framerate(&mut self, frame_rate: u32) -> Result<()> {
        if frame_rate == 0 {
            bail!("Framerate must be positive");
        }
        self.frame_rate = frame_rate;
        Ok(())
    }

    pub fn set_crf(&mut self, crf: u8) -> Result<()> {
        if crf > MAX_CRF {
            bail!("CRF must be between 0 and {}", MAX_CRF);
        }
        self.crf = crf;
        Ok(())
    }

    pub fn set_preset(&mut self, preset: u8) -> Result<()> {
        if preset > MAX_PRESET {
            bail!("Preset must be between 0 and {}", MAX_PRESET);
        }
        self.preset = preset;
        Ok(())
    }

    // Audio

    pub fn set_bitrate(&mut self, kbps: u32) -> Result<()> {
        if kbps == 0 {
            bail!("Bitrate must be positive");
        }
        self.audio_bitrate_kbps = kbps;
        Ok(())
    }

    pub fn set_vbr(&mut self, vbr: bool) {
        self.vbr = vbr;
    }

    // Export

    pub fn open_output_file(&mut self, path: &str) {
        self.output_file = path.to_string();
    }

    pub fn container_mkv(&mut self) {
        self.container = Container::Mkv;
    }

    pub fn container_webm(&mut self) {
        self.container = Container::Webm;
    }

    /// Snapshot the current fields as a job
    pub fn build_job(&self) -> JobSpec {
        JobSpec {
            source_path: self.source_file_absolute.clone(),
            output_path: self.output_file.clone(),
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            crf: self.crf,
            preset: self.preset,
            audio_bitrate_kbps: self.audio_bitrate_kbps,
            vbr: self.vbr,
            container: self.container,
        }
    }

    /// Start an export unless one is already running
    pub fn start_export(&mut self, ctx: &AppContext) -> Reply {
        if self.is_encoding() {
            info!("Export already running, ignoring start");
            return Reply::Ignored("An export is already running".to_string());
        }

        let job = self.build_job();
        let output = job.resolved_output();

        self.encode_button_visible = false;
        self.encoding_spinner_visible = true;
        self.job_state = JobState::Running;
        self.pending_output = output.clone();
        self.pending = Some(ctx.runner.spawn(job));

        Reply::Show(format!("Encoding to {}...", output.display()))
    }

    pub fn is_encoding(&self) -> bool {
        self.pending.is_some()
    }

    /// Completion receiver of the running export
    pub fn pending_export(&mut self) -> Option<&mut oneshot::Receiver<EncodeResult>> {
        self.pending.as_mut()
    }

    /// Wait for the running export and apply its result
    pub async fn wait_for_export(&mut self, ctx: &AppContext) -> Option<EncodeResult> {
        let rx = self.pending.as_mut()?;
        let received = rx.await;
        Some(self.complete_export(ctx, received))
    }

    /// Apply whatever the completion channel delivered
    pub fn complete_export(
        &mut self,
        ctx: &AppContext,
        received: Result<EncodeResult, oneshot::error::RecvError>,
    ) -> EncodeResult {
        let result = match received {
            Ok(result) => result,
            Err(_) => {
                error!("Encode task ended without a result");
                EncodeResult {
                    success: false,
                    elapsed_seconds: 0.0,
                    output_path: self.pending_output.clone(),
                    error_message: Some("The encode task stopped unexpectedly".to_string()),
                }
            }
        };
        self.finish_export(ctx, result.clone());
        result
    }

    /// Restore the window and report the result
    pub fn finish_export(&mut self, ctx: &AppContext, result: EncodeResult) {
        self.pending = None;
        self.encode_button_visible = true;
        self.encoding_spinner_visible = false;
        self.job_state = JobState::from(&result);

        if result.success {
            ctx.notifier
                .notify(result.elapsed_seconds, &result.output_path);
        } else {
            let message = result.error_message.as_deref().unwrap_or("unknown error");
            warn!("Export failed: {}", message);
            ctx.notifier.notify_failure(&result.output_path, message);
        }

        self.last_result = Some(result);
    }

    /// Human-readable summary of every field
    pub fn status(&self) -> String {
        let source: &str = if self.source_file_label.is_empty() {
            "(none)"
        } else {
            &self.source_file_label
        };
        let output: &str = if self.output_file.is_empty() {
            "(none)"
        } else {
            &self.output_file
        };
        let state = match (&self.job_state, &self.last_result) {
            (JobState::Running, _) => "encoding".to_string(),
            (JobState::Completed, Some(last)) => format!(
                "finished {} ({})",
                last.output_path.display(),
                humanize(last.elapsed_seconds)
            ),
            (JobState::Completed, None) => "finished".to_string(),
            (JobState::Failed(message), _) => format!("failed: {}", message),
            (JobState::Idle, _) => "ready".to_string(),
        };
        let button = if self.encode_button_visible { " [export]" } else { "" };

        format!(
            "source:     {}\n\
             resolution: {}x{}\n\
             framerate:  {}\n\
             crf:        {}\n\
             preset:     {}\n\
             bitrate:    {}K (vbr {})\n\
             output:     {} [{}]\n\
             encode:     {}{}{}",
            source,
            self.width,
            self.height,
            self.frame_rate,
            self.crf,
            self.preset,
            self.audio_bitrate_kbps,
            if self.vbr { "on" } else { "off" },
            output,
            self.container,
            state,
            button,
            if self.encoding_spinner_visible { " ..." } else { "" },
        )
    }

    #[cfg(test)]
    pub fn job_state(&self) -> &JobState {
        &self.job_state
    }

    #[cfg(test)]
    pub fn encode_button_visible(&self) -> bool {
        self.encode_button_visible
    }

    #[cfg(test)]
    pub fn last_result(&self) -> Option<&EncodeResult> {
        self.last_result.as_ref()
    }
}
