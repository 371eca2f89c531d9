//! Completion notifications

use log::{debug, info, warn};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::runtime::Handle;

/// Notification title
pub const APP_TITLE: &str = "Aviator";

const UNITS: [(&str, u64); 5] = [
    ("year", 365 * 24 * 60 * 60),
    ("day", 24 * 60 * 60),
    ("hour", 60 * 60),
    ("minute", 60),
    ("second", 1),
];

/// Render a duration as e.g. "1 hour, 1 minute and 1 second"
pub fn humanize(seconds: f64) -> String {
    let mut remaining = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };

    if remaining == 0 {
        return "now".to_string();
    }

    let mut parts = Vec::new();
    for (word, size) in UNITS {
        let count = remaining / size;
        remaining %= size;
        match count {
            0 => {}
            1 => parts.push(format!("1 {}", word)),
            n => parts.push(format!("{} {}s", n, word)),
        }
    }

    match parts.split_last() {
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
        None => "now".to_string(),
    }
}

/// Completion message body
pub fn completion_message(elapsed_seconds: f64, output_path: &Path) -> String {
    format!(
        "({}) Finished encoding {}",
        humanize(elapsed_seconds),
        output_path.display()
    )
}

/// Where notifications go
pub trait Notifier: Send + Sync {
    /// Deliver one title/body pair. Failures are logged, never returned.
    fn send(&self, title: &str, body: &str);

    /// Report a finished encode
    fn notify(&self, elapsed_seconds: f64, output_path: &Path) {
        self.send(APP_TITLE, &completion_message(elapsed_seconds, output_path));
    }

    /// Report a failed encode
    fn notify_failure(&self, output_path: &Path, message: &str) {
        self.send(
            APP_TITLE,
            &format!("Encoding {} failed: {}", output_path.display(), message),
        );
    }
}

/// Desktop notifications through `notify-send`
#[derive(Clone, Debug)]
pub struct DesktopNotifier {
    program: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            program: "notify-send".to_string(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn send(&self, title: &str, body: &str) {
        info!("{}: {}", title, body);

        let Ok(handle) = Handle::try_current() else {
            warn!("No async runtime, skipping {}", self.program);
            return;
        };

        let spawned = Command::new(&self.program)
            .args(["--app-name", APP_TITLE, title, body])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        // Reaped in the background; the caller does not wait for delivery
        match spawned {
            Ok(mut child) => {
                let program = self.program.clone();
                handle.spawn(async move {
                    match child.wait().await {
                        Ok(status) if status.success() => debug!("Notification delivered"),
                        Ok(status) => warn!("{} exited with {}", program, status),
                        Err(e) => warn!("Failed to wait for {}: {}", program, e),
                    }
                });
            }
            Err(e) => warn!("Failed to deliver notification via {}: {}", self.program, e),
        }
    }
}

/// Notifications written to the log only
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, title: &str, body: &str) {
        info!("{}: {}", title, body);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    #[test]
    fn test_humanize_now() {
        assert_eq!(humanize(0.0), "now");
        assert_eq!(humanize(0.4), "now");
    }

    #[test]
    fn test_humanize_units() {
        assert_eq!(humanize(1.0), "1 second");
        assert_eq!(humanize(2.0), "2 seconds");
        assert_eq!(humanize(61.0), "1 minute and 1 second");
        assert_eq!(humanize(120.0), "2 minutes");
        assert_eq!(humanize(3661.0), "1 hour, 1 minute and 1 second");
        assert_eq!(humanize(7322.0), "2 hours, 2 minutes and 2 seconds");
    }

    #[test]
    fn test_humanize_large() {
        let text = humanize(90000.0);
        assert_eq!(text, "1 day and 1 hour");
        assert_eq!(text.matches(" and ").count(), 1);

        assert_eq!(
            humanize((366 * 24 * 3600 + 3600 + 1) as f64),
            "1 year, 1 day, 1 hour and 1 second"
        );
    }

    #[test]
    fn test_humanize_rounds() {
        assert_eq!(humanize(59.6), "1 minute");
    }

    #[test]
    fn test_notify_message() {
        let notifier = RecordingNotifier::default();
        notifier.notify(61.0, Path::new("out.mkv"));

        let sent = notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, APP_TITLE);
        assert_eq!(sent[0].1, "(1 minute and 1 second) Finished encoding out.mkv");
    }

    #[tokio::test]
    async fn test_desktop_notifier_missing_program_is_silent() {
        let notifier = DesktopNotifier {
            program: "/nonexistent/aviator-notify-send".to_string(),
        };
        notifier.notify(1.0, Path::new("out.mkv"));
    }

    #[test]
    fn test_desktop_notifier_without_runtime_is_silent() {
        DesktopNotifier::default().notify(1.0, Path::new("out.mkv"));
    }
}
