//! Error types for the extraction pipeline

use thiserror::Error;

/// Errors that can occur during extraction
///
/// Per-chunk problems (malformed model output, per-chunk timeouts) never
/// surface here - they degrade the affected chunk to an empty extraction and
/// the pipeline continues. These variants are the terminal failures.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Extraction settings failed validation
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// A model response could not be parsed as extraction JSON
    #[error("Model response was not valid extraction JSON: {0}")]
    InvalidResponse(String),

    /// The overall pipeline deadline fired; partial results are abandoned
    #[error("Extraction timed out after {0}s")]
    PipelineTimeout(u64),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidResponse(e.to_string())
    }
}
