//! Error types for review and commit

use thiserror::Error;

/// Errors that can occur during review or commit
///
/// Per-item commit failures are not errors: they are logged, skipped, and
/// counted in the report. Only problems that invalidate the whole operation
/// surface here.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// A decision referenced a temp id that is not in the queue
    #[error("Unknown staged entity: {0}")]
    UnknownTempId(String),

    /// The store failed in a way that invalidates the whole commit
    #[error("Store error: {0}")]
    Store(String),
}
