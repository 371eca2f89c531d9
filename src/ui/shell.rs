//! Line-oriented shell driving the windows

use anyhow::Result;
use log::{debug, info};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

use super::onboarding::WELCOME;
use super::{EventTable, MainWindow, Reply};
use crate::app::AppContext;
use crate::transcoder::EncodeResult;

enum Input {
    Line(usize),
    Finished(Result<EncodeResult, oneshot::error::RecvError>),
}

/// Run on stdin until `quit` or end of input
pub async fn run(ctx: &AppContext, window: &mut MainWindow) -> Result<()> {
    run_with(ctx, window, BufReader::new(io::stdin())).await
}

/// Run on any line source until `quit` or end of input
pub async fn run_with<R>(ctx: &AppContext, window: &mut MainWindow, mut reader: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut table = if ctx.first_open() {
        info!("First launch, showing onboarding");
        println!("{}", WELCOME);
        EventTable::onboarding()
    } else {
        println!("{}", window.status());
        EventTable::main_window()
    };

    // Kept across iterations: a read interrupted by a finished export resumes here
    let mut buf = Vec::new();

    loop {
        let input = match window.pending_export() {
            Some(rx) => tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => Input::Line(read?),
                received = rx => Input::Finished(received),
            },
            None => Input::Line(reader.read_until(b'\n', &mut buf).await?),
        };

        match input {
            Input::Finished(received) => {
                let result = window.complete_export(ctx, received);
                match &result.error_message {
                    None => println!("Finished encoding {}", result.output_path.display()),
                    Some(message) => println!("Export failed: {}", message),
                }
                continue;
            }
            Input::Line(0) => {
                debug!("End of input");
                return Ok(());
            }
            Input::Line(_) => {}
        }

        // Paths need not be UTF-8; decode lossily rather than reject the line
        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        buf.clear();

        match table.dispatch(window, ctx, &line) {
            Ok(Reply::Show(text)) => println!("{}", text),
            Ok(Reply::Ignored(text)) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Ok(Reply::OpenMainWindow) => {
                table = EventTable::main_window();
                println!("{}", window.status());
            }
            Ok(Reply::Quit) => return Ok(()),
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }
}
