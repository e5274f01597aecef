use thiserror::Error;

/// Failures at the edges of the timer: config files, report export and
/// session entry. Timing and navigation themselves never fail.
#[derive(Error, Debug)]
pub enum PacerError {
    #[error("cannot start a presentation without sections")]
    NoSections,

    #[error("no section at position {index} (have {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("no presenter named {0:?}")]
    UnknownPresenter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PacerError>;
