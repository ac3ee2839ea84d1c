//! Analyzer error taxonomy.
//!
//! Only contract violations surface to the caller. Decode failures and
//! insufficient pitch data are recovered internally by routing to the
//! fallback generator; degenerate calculator inputs are handled inside
//! each calculator and are not errors at all.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during voice analysis
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Failed to decode audio file {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Insufficient pitch data: {found} usable frames (need {required})")]
    InsufficientPitchData { found: usize, required: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AnalyzerError {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
