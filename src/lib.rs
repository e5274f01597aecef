// Library surface for headless/integration tests and reuse.
// The binary only adds the CLI and the terminal loop on top of this.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod report;
pub mod runtime;
pub mod schedule;
pub mod section;
pub mod tracker;
pub mod ui;

pub use error::{PacerError, Result};
