//! Runs one encode job as an ffmpeg child process

use log::{debug, error, info};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::oneshot;

use super::{FfmpegError, JobSpec};

/// Outcome of one encode job
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeResult {
    pub success: bool,
    pub elapsed_seconds: f64,
    pub output_path: PathBuf,
    pub error_message: Option<String>,
}

impl EncodeResult {
    fn completed(output_path: PathBuf, elapsed_seconds: f64) -> Self {
        Self {
            success: true,
            elapsed_seconds,
            output_path,
            error_message: None,
        }
    }

    fn failed(output_path: PathBuf, elapsed_seconds: f64, message: String) -> Self {
        Self {
            success: false,
            elapsed_seconds,
            output_path,
            error_message: Some(message),
        }
    }
}

/// Job lifecycle
#[derive(Clone, Debug, PartialEq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Failed(String),
}

impl From<&EncodeResult> for JobState {
    fn from(result: &EncodeResult) -> Self {
        match &result.error_message {
            None if result.success => JobState::Completed,
            Some(message) => JobState::Failed(message.clone()),
            None => JobState::Failed("unknown error".to_string()),
        }
    }
}

/// ffmpeg launcher
#[derive(Clone, Debug)]
pub struct EncodeRunner {
    program: PathBuf,
}

impl EncodeRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `job` to completion. Always produces exactly one result.
    pub async fn run(&self, job: JobSpec) -> EncodeResult {
        let output_path = job.resolved_output();

        if let Err(e) = job.validate() {
            error!("Refusing to start encode: {:#}", e);
            return EncodeResult::failed(output_path, 0.0, e.to_string());
        }

        let args = job.build_ffmpeg_args();
        info!("Running {:?} {:?}", self.program, args);
        if let Ok(json) = serde_json::to_string(&job) {
            debug!("Job: {}", json);
        }

        let start = Instant::now();
        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .output()
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(output) if output.status.success() => {
                info!("Encode completed in {:.2}s: {:?}", elapsed, output_path);
                EncodeResult::completed(output_path, elapsed)
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let message = if stderr.trim().is_empty() {
                    format!("ffmpeg exited with {}", output.status)
                } else {
                    let classified = FfmpegError::parse(&stderr);
                    debug!("Classified ffmpeg failure as {:?}", classified.kind);
                    classified.format_user_message()
                };
                error!("Encode failed ({}): {}", output.status, message);
                debug!("ffmpeg stderr:\n{}", stderr);
                EncodeResult::failed(output_path, elapsed, message)
            }
            Err(e) => {
                error!("Failed to run {:?}: {}", self.program, e);
                EncodeResult::failed(
                    output_path,
                    elapsed,
                    format!("Failed to launch {}: {}", self.program.display(), e),
                )
            }
        }
    }

    /// Run `job` on its own task; the receiver resolves once with the result
    pub fn spawn(&self, job: JobSpec) -> oneshot::Receiver<EncodeResult> {
        let (tx, rx) = oneshot::channel();
        let runner = self.clone();
        tokio::spawn(async move {
            let result = runner.run(job).await;
            if tx.send(result).is_err() {
                debug!("Encode result dropped, nobody is waiting");
            }
        });
        rx
    }
}
