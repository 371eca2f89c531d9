//! Terminal UI: windows, event table and shell

mod about;
mod events;
mod main_window;
mod onboarding;
pub mod shell;

pub use events::EventTable;
pub use main_window::MainWindow;

/// Result of handling one UI event
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Text to show the user
    Show(String),
    /// Event had no effect
    Ignored(String),
    /// Leave onboarding and present the main window
    OpenMainWindow,
    /// Quit the application
    Quit,
}
