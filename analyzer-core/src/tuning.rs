//! # Tuning Estimation
//!
//! Infers the concert-pitch reference (the frequency of A4, nominally
//! 440 Hz) from a population of pitch readings. Every estimate, automatic
//! or annotated, goes through the same reduction exactly once:
//!
//! 1. each frequency's fractional semitone deviation from the nearest
//!    equal-tempered pitch under A4 = 440 Hz is computed,
//! 2. the deviations are folded into `[-0.5, 0.5)` and the most populated
//!    histogram bin wins, giving one best-fit offset in semitones,
//! 3. the corrected reference is `440 * 2^(offset / 12)`.
//!
//! Automatic mode feeds every sample of every tone segment through the
//! reduction. Annotated mode restricts the population per user-declared
//! note and time window first, producing one estimate per annotation plus
//! summary statistics over the batch.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::segment::ToneSegment;
use crate::{notes, stats};

/// The nominal concert-pitch reference in Hz.
pub const REFERENCE_A4: f32 = 440.0;

/// Histogram resolution of the offset reduction, in fractional bins.
pub const TUNING_RESOLUTION: f32 = 0.01;

/// Pitch-class resolution of the offset reduction: 12-tone equal
/// temperament.
pub const BINS_PER_OCTAVE: u32 = 12;

/// A user-declared note with the time window it sustains over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteAnnotation {
    /// Note name as entered ("A4", "Bb3", ...); normalized on use.
    pub note: String,
    /// Window start in seconds, inclusive.
    pub start: f32,
    /// Window end in seconds, inclusive.
    pub end: f32,
}

/// One inferred A4 reference frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningEstimate {
    /// Estimated frequency of A4 in Hz.
    pub a4: f32,
    /// Canonical note name the estimate came from, `None` in automatic mode.
    pub note: Option<String>,
    /// Number of pitch samples that contributed.
    pub sample_count: usize,
}

/// Why an annotation contributed no estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The note name failed to parse or normalize.
    Malformed(String),
    /// The window end precedes its start.
    InvertedWindow,
    /// No segment samples matched the note inside the window.
    NoMatchingSamples,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Malformed(msg) => write!(f, "{}", msg),
            SkipReason::InvertedWindow => write!(f, "window end precedes start"),
            SkipReason::NoMatchingSamples => write!(f, "no matching samples in window"),
        }
    }
}

/// An annotation that was excluded from a batch, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAnnotation {
    /// The annotation as the user supplied it.
    pub annotation: NoteAnnotation,
    /// Why it was excluded.
    pub reason: SkipReason,
}

/// The outcome of annotated estimation: per-annotation estimates plus
/// explicit markers for everything that was skipped.
#[derive(Debug, Clone, Default)]
pub struct EstimateBatch {
    /// One estimate per annotation that survived filtering.
    pub estimates: Vec<TuningEstimate>,
    /// Annotations excluded from the batch, with reasons.
    pub skipped: Vec<SkippedAnnotation>,
}

impl EstimateBatch {
    /// A4 values of the surviving estimates.
    pub fn a4_values(&self) -> Vec<f32> {
        self.estimates.iter().map(|e| e.a4).collect()
    }

    /// Mean of the estimates, `None` when the batch is empty.
    pub fn mean(&self) -> Option<f32> {
        stats::mean(&self.a4_values())
    }

    /// Median of the estimates, `None` when the batch is empty.
    pub fn median(&self) -> Option<f32> {
        stats::median(&self.a4_values())
    }

    /// Population standard deviation, `None` when the batch is empty.
    pub fn std_dev(&self) -> Option<f32> {
        stats::std_dev(&self.a4_values())
    }
}

/// Best-fit deviation of a pitch population from an equal-tempered scale
/// under A4 = 440 Hz, in fractional bins within `[-0.5, 0.5)`.
///
/// The octave is divided into `bins_per_octave` equal steps (12 for the
/// semitone scale used throughout the analyzer). Each frequency is
/// reduced to its residual from the nearest scale step, then the
/// residuals are binned at `resolution` and the fullest histogram bin's
/// left edge is returned. Octaves fold onto the same residual, so 880 Hz
/// and 440 Hz contribute identically.
///
/// Nonpositive frequencies are ignored; an empty population reduces to a
/// zero offset.
pub fn pitch_tuning(frequencies: &[f32], resolution: f32, bins_per_octave: u32) -> f32 {
    let residuals: Vec<f32> = frequencies
        .iter()
        .filter(|&&f| f > 0.0)
        .map(|&f| {
            let steps = bins_per_octave as f32 * (f / REFERENCE_A4).log2();
            let frac = steps.rem_euclid(1.0);
            if frac >= 0.5 { frac - 1.0 } else { frac }
        })
        .collect();

    if residuals.is_empty() {
        return 0.0;
    }

    let buckets = (1.0 / resolution).ceil() as usize;
    let mut counts = vec![0usize; buckets];
    for residual in &residuals {
        let idx = ((residual + 0.5) / resolution) as usize;
        counts[idx.min(buckets - 1)] += 1;
    }

    // First-encountered maximum wins on ties.
    let mut best = 0;
    for (idx, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = idx;
        }
    }
    -0.5 + best as f32 * resolution
}

/// Maps a pitch population to the A4 reference it implies.
///
/// This is the single numeric invariant of the estimator:
/// `A4 = 440 * 2^(offset / 12)` with the offset from [`pitch_tuning`].
pub fn tuning_offset_to_a4(frequencies: &[f32]) -> f32 {
    let offset = pitch_tuning(frequencies, TUNING_RESOLUTION, BINS_PER_OCTAVE);
    REFERENCE_A4 * 2.0_f32.powf(offset / BINS_PER_OCTAVE as f32)
}

/// Estimates A4 from every sample of every extracted segment.
///
/// # Errors
/// [`AnalysisError::EmptyPopulation`] when the segments hold no samples
/// (e.g. an all-zero grid produced no segments).
pub fn estimate_a4_automatic(segments: &[ToneSegment]) -> Result<TuningEstimate> {
    let population: Vec<f32> = segments
        .iter()
        .flat_map(|segment| segment.frequencies().iter().copied())
        .collect();

    if population.is_empty() {
        return Err(AnalysisError::EmptyPopulation);
    }

    Ok(TuningEstimate {
        a4: tuning_offset_to_a4(&population),
        note: None,
        sample_count: population.len(),
    })
}

/// Estimates A4 once per annotation, restricted to matching segments.
///
/// For each annotation the note name is normalized (Bb4 → A#4), segments
/// whose mean frequency names the same note are selected, and only their
/// samples inside `[start, end]` (inclusive) are kept. The mean of the
/// surviving samples is reduced to one estimate.
///
/// A bad annotation never aborts the batch: malformed names, inverted
/// windows, and windows matching no samples are recorded as skips and
/// processing continues.
pub fn estimate_a4_annotated(
    segments: &[ToneSegment],
    annotations: &[NoteAnnotation],
) -> EstimateBatch {
    let mut batch = EstimateBatch::default();

    for annotation in annotations {
        let canonical = match notes::canonical_name(&annotation.note) {
            Ok(name) => name,
            Err(err) => {
                warn!("annotation `{}` skipped: {}", annotation.note, err);
                batch.skipped.push(SkippedAnnotation {
                    annotation: annotation.clone(),
                    reason: SkipReason::Malformed(err.to_string()),
                });
                continue;
            }
        };

        if annotation.end < annotation.start {
            warn!(
                "annotation `{}` skipped: window {}..{} is inverted",
                annotation.note, annotation.start, annotation.end
            );
            batch.skipped.push(SkippedAnnotation {
                annotation: annotation.clone(),
                reason: SkipReason::InvertedWindow,
            });
            continue;
        }

        let mut sample_count = 0usize;
        let mut freq_sum = 0.0f32;
        for segment in segments {
            if notes::hz_to_note(segment.mean_frequency()) != canonical {
                continue;
            }
            for (&time, &freq) in segment.times().iter().zip(segment.frequencies()) {
                if time >= annotation.start && time <= annotation.end {
                    sample_count += 1;
                    freq_sum += freq;
                }
            }
        }

        if sample_count == 0 {
            warn!("note `{}` not found, skipping...", annotation.note);
            batch.skipped.push(SkippedAnnotation {
                annotation: annotation.clone(),
                reason: SkipReason::NoMatchingSamples,
            });
            continue;
        }

        let freq_avg = freq_sum / sample_count as f32;
        batch.estimates.push(TuningEstimate {
            a4: tuning_offset_to_a4(&[freq_avg]),
            note: Some(canonical),
            sample_count,
        });
    }

    batch
}
