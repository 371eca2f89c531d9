//! Aviator - your video copilot
//!
//! Encodes videos to AV1 (SVT-AV1) with Opus audio through ffmpeg.
//!
//! # License
//! AGPL-3.0

mod app;
mod config;
mod ffmpeg;
mod notify;
mod transcoder;
mod ui;

use anyhow::Result;
use log::info;

use app::AppContext;
use config::Settings;
use ui::{shell, MainWindow};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("aviator v{} starting...", env!("CARGO_PKG_VERSION"));

    let ctx = AppContext::init(Settings::from_env());
    let mut window = MainWindow::new(&ctx.settings);

    let outcome = shell::run(&ctx, &mut window).await;
    ctx.teardown(&mut window).await;

    outcome
}
