//! Configuration

mod settings;

pub use settings::{first_open, Settings};
