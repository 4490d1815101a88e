//! Error types for the analysis core.
//!
//! One bad annotation or an empty population never aborts a whole analysis;
//! callers receive partial results with explicit markers for what was
//! skipped. Only structurally invalid input (mismatched buffer lengths,
//! inconsistent grid dimensions) is treated as a programming error and
//! panics at construction time.

use std::fmt;

/// Errors that can occur while estimating a tuning reference.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// An estimate was requested over zero pitch samples.
    EmptyPopulation,

    /// A note annotation failed to parse or normalize.
    MalformedAnnotation(String),

    /// Analysis parameters are inconsistent (e.g. window longer than FFT).
    InvalidParams(String),

    /// An audio file could not be read.
    Io(String),

    /// An audio file was readable but not in a supported format.
    UnsupportedFormat(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptyPopulation => {
                write!(f, "no pitch samples available for estimation")
            }
            AnalysisError::MalformedAnnotation(msg) => {
                write!(f, "malformed annotation: {}", msg)
            }
            AnalysisError::InvalidParams(msg) => write!(f, "invalid parameters: {}", msg),
            AnalysisError::Io(msg) => write!(f, "audio read error: {}", msg),
            AnalysisError::UnsupportedFormat(msg) => write!(f, "unsupported format: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AnalysisError::Io(e.to_string()),
            other => AnalysisError::UnsupportedFormat(other.to_string()),
        }
    }
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, AnalysisError>;
