// analyzer-core/src/lib.rs

//! The core logic for the concert-pitch analyzer.
//! This crate is responsible for audio loading, spectral pitch detection,
//! tone-segment extraction and tuning estimation. It is completely
//! headless and contains no terminal interaction.
//!
//! The pipeline is one-way:
//!
//! ```text
//! samples -> PitchGrid -> ToneSegment -> TuningEstimate
//! ```
//!
//! Every entry point is a pure function of its arguments; no state
//! persists between calls, so independent analysis windows can be
//! processed concurrently by the caller without coordination.

pub mod audio;
pub mod config;
pub mod error;
pub mod grid;
pub mod notes;
pub mod segment;
pub mod spectrum;
pub mod stats;
pub mod tuning;

pub use audio::{AudioData, load_wav};
pub use config::AnalysisParams;
pub use error::{AnalysisError, Result};
pub use grid::PitchGrid;
pub use segment::{ToneSegment, extract_segments};
pub use spectrum::detect_pitch_grid;
pub use tuning::{
    EstimateBatch, NoteAnnotation, SkipReason, SkippedAnnotation, TuningEstimate,
    estimate_a4_annotated, estimate_a4_automatic,
};
