//! Event dispatch table

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::about::about_text;
use super::onboarding;
use super::{MainWindow, Reply};
use crate::app::AppContext;

/// Event handler
pub type Handler = fn(&mut MainWindow, &AppContext, &[&str]) -> Result<Reply>;

struct Entry {
    handler: Handler,
    usage: &'static str,
    help: &'static str,
}

/// Maps event names to handlers
pub struct EventTable {
    entries: BTreeMap<&'static str, Entry>,
}

impl EventTable {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    fn on(
        mut self,
        name: &'static str,
        usage: &'static str,
        help: &'static str,
        handler: Handler,
    ) -> Self {
        self.entries.insert(name, Entry { handler, usage, help });
        self
    }

    /// Events accepted by the onboarding screen
    pub fn onboarding() -> Self {
        Self::new()
            .on("go", "go", "Open the main window", onboarding::go)
            .on("about", "about", "About Aviator", about)
            .on("help", "help", "List events", help_onboarding)
            .on("quit", "quit", "Quit", quit)
    }

    /// Events accepted by the main window
    pub fn main_window() -> Self {
        Self::new()
            .on("source", "source <path>", "Open a source file", open_source_file)
            .on(
                "same-resolution",
                "same-resolution",
                "Resolution same as source",
                resolution_same_as_source,
            )
            .on(
                "same-framerate",
                "same-framerate",
                "Framerate same as source",
                framerate_same_as_source,
            )
            .on("same-bitrate", "same-bitrate", "Bitrate same as source", bitrate_same_as_source)
            .on(
                "resolution",
                "resolution <width> <height>",
                "Set the output resolution",
                set_resolution,
            )
            .on("framerate", "framerate <fps>", "Set the output framerate", set_framerate)
            .on("crf", "crf <0-63>", "Set the quality (lower is better)", set_crf)
            .on("preset", "preset <0-13>", "Set the encoder preset (lower is slower)", set_preset)
            .on("bitrate", "bitrate <kbps>", "Set the audio bitrate", set_bitrate)
            .on("vbr", "vbr <on|off>", "Toggle variable audio bitrate", set_vbr)
            .on("output", "output <path>", "Choose the output file", open_output_file)
            .on("mkv", "mkv", "Export as MKV", container_mkv)
            .on("webm", "webm", "Export as WEBM", container_webm)
            .on("export", "export", "Start encoding", start_export)
            .on("status", "status", "Show current settings", status)
            .on("about", "about", "About Aviator", about)
            .on("help", "help", "List events", help_main)
            .on("quit", "quit", "Quit", quit)
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Parse one input line and run its handler
    pub fn dispatch(&self, window: &mut MainWindow, ctx: &AppContext, line: &str) -> Result<Reply> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Reply::Ignored(String::new()));
        };
        let args: Vec<&str> = words.collect();

        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| anyhow!("Unknown event `{}`, type `help`", name))?;
        debug!("Dispatching {} {:?}", name, args);
        (entry.handler)(window, ctx, &args).with_context(|| format!("usage: {}", entry.usage))
    }

    /// One line per event
    pub fn help(&self) -> String {
        self.entries
            .values()
            .map(|e| format!("  {:<28} {}", e.usage, e.help))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn arg<T>(args: &[&str], index: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args.get(index).ok_or_else(|| anyhow!("Missing {}", name))?;
    raw.parse().with_context(|| format!("Invalid {} {:?}", name, raw))
}

fn path_arg(args: &[&str]) -> Result<String> {
    if args.is_empty() {
        bail!("Missing path");
    }
    Ok(args.join(" "))
}

fn open_source_file(window: &mut MainWindow, ctx: &AppContext, args: &[&str]) -> Result<Reply> {
    let path = path_arg(args)?;
    window.open_source_file(ctx, &path);
    Ok(Reply::Show(window.status()))
}

fn resolution_same_as_source(
    window: &mut MainWindow,
    ctx: &AppContext,
    _: &[&str],
) -> Result<Reply> {
    window.resolution_same_as_source(ctx);
    Ok(Reply::Show(window.status()))
}

fn framerate_same_as_source(
    window: &mut MainWindow,
    ctx: &AppContext,
    _: &[&str],
) -> Result<Reply> {
    window.framerate_same_as_source(ctx);
    Ok(Reply::Show(window.status()))
}

fn bitrate_same_as_source(window: &mut MainWindow, ctx: &AppContext, _: &[&str]) -> Result<Reply> {
    window.bitrate_same_as_source(ctx);
    Ok(Reply::Show(window.status()))
}

fn set_resolution(window: &mut MainWindow, _: &AppContext, args: &[&str]) -> Result<Reply> {
    window.set_resolution(arg(args, 0, "width")?, arg(args, 1, "height")?)?;
    Ok(Reply::Show(window.status()))
}

fn set_framerate(window: &mut MainWindow, _: &AppContext, args: &[&str]) -> Result<Reply> {
    window.set_framerate(arg(args, 0, "framerate")?)?;
    Ok(Reply::Show(window.status()))
}

fn set_crf(window: &mut MainWindow, _: &AppContext, args: &[&str]) -> Result<Reply> {
    window.set_crf(arg(args, 0, "crf")?)?;
    Ok(Reply::Show(window.status()))
}

fn set_preset(window: &mut MainWindow, _: &AppContext, args: &[&str]) -> Result<Reply> {
    window.set_preset(arg(args, 0, "preset")?)?;
    Ok(Reply::Show(window.status()))
}

fn set_bitrate(window: &mut MainWindow, _: &AppContext, args: &[&str]) -> Result<Reply> {
    window.set_bitrate(arg(args, 0, "bitrate")?)?;
    Ok(Reply::Show(window.status()))
}

fn set_vbr(window: &mut MainWindow, _: &AppContext, args: &[&str]) -> Result<Reply> {
    let vbr = match args.first().map(|s| s.to_lowercase()).as_deref() {
        Some("on" | "true" | "yes" | "1") => true,
        Some("off" | "false" | "no" | "0") => false,
        Some(other) => bail!("Expected on or off, got {:?}", other),
        None => bail!("Missing on/off"),
    };
    window.set_vbr(vbr);
    Ok(Reply::Show(window.status()))
}

fn open_output_file(window: &mut MainWindow, _: &AppContext, args: &[&str]) -> Result<Reply> {
    let path = path_arg(args)?;
    window.open_output_file(&path);
    Ok(Reply::Show(window.status()))
}

fn container_mkv(window: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    window.container_mkv();
    Ok(Reply::Show(window.status()))
}

fn container_webm(window: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    window.container_webm();
    Ok(Reply::Show(window.status()))
}

fn start_export(window: &mut MainWindow, ctx: &AppContext, _: &[&str]) -> Result<Reply> {
    Ok(window.start_export(ctx))
}

fn status(window: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    Ok(Reply::Show(window.status()))
}

fn about(_: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    Ok(Reply::Show(about_text()))
}

fn help_main(_: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    Ok(Reply::Show(EventTable::main_window().help()))
}

fn help_onboarding(_: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    Ok(Reply::Show(EventTable::onboarding().help()))
}

fn quit(_: &mut MainWindow, _: &AppContext, _: &[&str]) -> Result<Reply> {
    Ok(Reply::Quit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::notify::testing::RecordingNotifier;
    use crate::transcoder::{Container, EncodeRunner, MediaProbe};
    use std::sync::Arc;

    fn context(notifier: RecordingNotifier) -> AppContext {
        AppContext::from_parts(
            Settings::default(),
            MediaProbe::new("echo"),
            EncodeRunner::new("true"),
            Arc::new(notifier),
            None,
        )
    }

    #[test]
    fn test_dispatch_updates_window() {
        let ctx = context(RecordingNotifier::default());
        let table = EventTable::main_window();
        let mut window = MainWindow::new(&ctx.settings);

        for line in [
            "source /videos/my clip.mp4",
            "resolution 1280 720",
            "framerate 30",
            "crf 40",
            "preset 8",
            "bitrate 96",
            "vbr off",
            "output /videos/out.webm",
            "webm",
        ] {
            table.dispatch(&mut window, &ctx, line).unwrap();
        }

        let job = window.build_job();
        assert_eq!(job.source_path, "/videos/my clip.mp4");
        assert_eq!((job.width, job.height), (1280, 720));
        assert_eq!(job.frame_rate, 30);
        assert_eq!(job.crf, 40);
        assert_eq!(job.preset, 8);
        assert_eq!(job.audio_bitrate_kbps, 96);
        assert!(!job.vbr);
        assert_eq!(job.container, Container::Webm);
        assert_eq!(job.resolved_output().to_str(), Some("/videos/out.webm"));
    }

    #[test]
    fn test_dispatch_errors_do_not_change_state() {
        let ctx = context(RecordingNotifier::default());
        let table = EventTable::main_window();
        let mut window = MainWindow::new(&ctx.settings);

        assert!(table.dispatch(&mut window, &ctx, "crf abc").is_err());
        assert!(table.dispatch(&mut window, &ctx, "crf 99").is_err());
        assert!(table.dispatch(&mut window, &ctx, "resolution 1280").is_err());
        assert!(table.dispatch(&mut window, &ctx, "vbr maybe").is_err());
        assert!(table.dispatch(&mut window, &ctx, "source").is_err());
        assert!(table.dispatch(&mut window, &ctx, "launch").is_err());
        assert_eq!(window.build_job().crf, 32);
    }

    #[test]
    fn test_blank_line_is_ignored() {
        let ctx = context(RecordingNotifier::default());
        let mut window = MainWindow::new(&ctx.settings);
        let reply = EventTable::main_window()
            .dispatch(&mut window, &ctx, "   ")
            .unwrap();
        assert!(matches!(reply, Reply::Ignored(_)));
    }

    #[test]
    fn test_onboarding_table() {
        let ctx = context(RecordingNotifier::default());
        let table = EventTable::onboarding();
        let mut window = MainWindow::new(&ctx.settings);

        assert!(!table.contains("export"));
        assert_eq!(
            table.dispatch(&mut window, &ctx, "go").unwrap(),
            Reply::OpenMainWindow
        );
        assert_eq!(table.dispatch(&mut window, &ctx, "quit").unwrap(), Reply::Quit);
    }

    #[test]
    fn test_help_lists_events() {
        let help = EventTable::main_window().help();
        assert!(help.contains("export"));
        assert!(help.contains("same-resolution"));
    }

    #[tokio::test]
    async fn test_export_twice_is_single_flight() {
        let notifier = RecordingNotifier::default();
        let ctx = context(notifier.clone());
        let table = EventTable::main_window();
        let mut window = MainWindow::new(&ctx.settings);
        for line in [
            "source in.mp4",
            "resolution 1280 720",
            "framerate 30",
            "bitrate 128",
            "output out",
        ] {
            table.dispatch(&mut window, &ctx, line).unwrap();
        }

        assert!(matches!(table.dispatch(&mut window, &ctx, "export").unwrap(), Reply::Show(_)));
        assert!(matches!(table.dispatch(&mut window, &ctx, "export").unwrap(), Reply::Ignored(_)));

        window.wait_for_export(&ctx).await;
        assert_eq!(notifier.bodies().len(), 1);
    }
}
