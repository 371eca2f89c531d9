//! About dialog

/// Program name
pub const PROGRAM_NAME: &str = "Aviator";
const TAGLINE: &str = "Your Video Copilot";
const COPYRIGHT: &str = "Copyright © 2022 Nate Sales and Gianni Rosato";
const LICENSE: &str = "AGPL-3.0";
const WEBSITE: &str = "https://github.com/natesales/aviator";

/// Dialog contents
pub fn about_text() -> String {
    format!(
        "{} v{}\n{}\n{}\nLicense: {}\nAuthors: {}\nGitHub: {}",
        PROGRAM_NAME,
        env!("CARGO_PKG_VERSION"),
        TAGLINE,
        COPYRIGHT,
        LICENSE,
        env!("CARGO_PKG_AUTHORS").replace(':', ", "),
        WEBSITE,
    )
}
