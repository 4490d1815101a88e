//! # Tone Segment Extraction
//!
//! Turns a raw [`PitchGrid`] into discrete tone segments: contiguous runs
//! of frames within a single frequency bin that continuously report a
//! pitch candidate. Runs shorter than the configured minimum are dropped,
//! as are runs whose first reading sits at or above the frequency ceiling.
//!
//! Grouping is strictly per bin. A stable fundamental tends to stay inside
//! one bin's detection window for the duration of a held note, so no
//! cross-bin tracking or octave-jump correction is attempted. This is a
//! known simplification of the extractor, kept deliberately.

use log::debug;

use crate::config::AnalysisParams;
use crate::grid::{PitchGrid, frames_to_time};

/// One contiguous run of pitch readings from a single frequency bin.
///
/// `times` and `frequencies` are parallel: entry `i` of each describes the
/// same analysis frame. Timestamps are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSegment {
    times: Vec<f32>,
    frequencies: Vec<f32>,
}

impl ToneSegment {
    /// Builds a segment from parallel time/frequency sequences.
    ///
    /// # Panics
    /// If the sequences differ in length or the timestamps are not
    /// strictly increasing. Both are contract violations by the caller.
    pub fn new(times: Vec<f32>, frequencies: Vec<f32>) -> Self {
        assert_eq!(
            times.len(),
            frequencies.len(),
            "segment times and frequencies must be parallel"
        );
        assert!(
            times.windows(2).all(|pair| pair[0] < pair[1]),
            "segment timestamps must be strictly increasing"
        );
        Self { times, frequencies }
    }

    /// Timestamps in seconds, one per covered frame.
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// Frequency readings in Hz, aligned with [`Self::times`].
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Number of frames the segment covers.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when the segment covers no frames. Extraction never produces
    /// such a segment; this exists for completeness of the type.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Timestamp of the first covered frame.
    pub fn start_time(&self) -> f32 {
        self.times[0]
    }

    /// Timestamp of the last covered frame.
    pub fn end_time(&self) -> f32 {
        self.times[self.times.len() - 1]
    }

    /// Arithmetic mean of the segment's frequency readings.
    pub fn mean_frequency(&self) -> f32 {
        self.frequencies.iter().sum::<f32>() / self.frequencies.len() as f32
    }
}

/// Extracts every qualifying tone segment from a pitch grid.
///
/// Each grid row is scanned left to right, accumulating runs of nonzero
/// readings. A run closes on the first zero entry or at the end of the
/// row, and is kept only when
///
/// - it spans at least `params.min_pitch_frames` frames, and
/// - its first frequency reading is below `freq_ceiling`.
///
/// The ceiling check looks at the first sample only, not the run's mean or
/// maximum. Matching the established behavior of the estimator matters
/// more here than the arguably stricter alternatives, so the rule is kept
/// exactly as is.
///
/// Never fails: a row without qualifying runs contributes nothing, and a
/// degenerate grid yields an empty vec.
pub fn extract_segments(
    grid: &PitchGrid,
    params: &AnalysisParams,
    freq_ceiling: f32,
) -> Vec<ToneSegment> {
    let mut segments = Vec::new();

    for bin in 0..grid.bins() {
        let mut run_frames: Vec<usize> = Vec::new();
        let mut run_freqs: Vec<f32> = Vec::new();

        for (frame, &reading) in grid.row(bin).iter().enumerate() {
            if reading != 0.0 {
                run_frames.push(frame);
                run_freqs.push(reading);
            } else {
                close_run(&mut run_frames, &mut run_freqs, params, freq_ceiling, &mut segments);
            }
        }
        // A run still open at the end of the row closes under the same rules.
        close_run(&mut run_frames, &mut run_freqs, params, freq_ceiling, &mut segments);
    }

    debug!(
        "extracted {} tone segments from {}x{} grid",
        segments.len(),
        grid.bins(),
        grid.frames()
    );
    segments
}

/// Closes the current run, materializing a segment when it qualifies.
fn close_run(
    run_frames: &mut Vec<usize>,
    run_freqs: &mut Vec<f32>,
    params: &AnalysisParams,
    freq_ceiling: f32,
    segments: &mut Vec<ToneSegment>,
) {
    if run_frames.is_empty() {
        return;
    }
    if run_frames.len() >= params.min_pitch_frames && run_freqs[0] < freq_ceiling {
        let times = frames_to_time(run_frames, params.sample_rate, params.hop_length);
        segments.push(ToneSegment::new(times, std::mem::take(run_freqs)));
    }
    run_frames.clear();
    run_freqs.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AnalysisParams {
        AnalysisParams {
            min_pitch_frames: 3,
            ..AnalysisParams::default()
        }
    }

    fn single_row_grid(row: Vec<f32>) -> PitchGrid {
        let frames = row.len();
        PitchGrid::new(1, frames, row)
    }

    #[test]
    fn five_frame_run_yields_one_segment() {
        let grid = single_row_grid(vec![440.0, 441.0, 440.5, 439.8, 440.2, 0.0, 0.0]);
        let segments = extract_segments(&grid, &params(), 1024.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 5);
    }

    #[test]
    fn short_runs_are_discarded_silently() {
        let grid = single_row_grid(vec![440.0, 441.0, 0.0, 439.0, 0.0, 0.0]);
        let segments = extract_segments(&grid, &params(), 1024.0);
        assert!(segments.is_empty());
    }

    #[test]
    fn trailing_run_is_closed_at_end_of_row() {
        // The run never hits a zero sentinel before the row ends.
        let grid = single_row_grid(vec![0.0, 0.0, 440.0, 441.0, 440.5, 439.9]);
        let segments = extract_segments(&grid, &params(), 1024.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 4);
    }

    #[test]
    fn ceiling_applies_to_first_sample_only() {
        // First reading above the ceiling: dropped even though the rest
        // of the run is in band.
        let grid = single_row_grid(vec![1500.0, 440.0, 440.0, 440.0, 0.0]);
        assert!(extract_segments(&grid, &params(), 1024.0).is_empty());

        // First reading below the ceiling: kept even though a later
        // reading exceeds it.
        let grid = single_row_grid(vec![440.0, 1500.0, 440.0, 440.0, 0.0]);
        assert_eq!(extract_segments(&grid, &params(), 1024.0).len(), 1);
    }

    #[test]
    fn interior_gaps_split_runs() {
        let grid = single_row_grid(vec![
            440.0, 440.0, 440.0, 0.0, 330.0, 330.0, 330.0, 330.0, 0.0,
        ]);
        let segments = extract_segments(&grid, &params(), 1024.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 3);
        assert_eq!(segments[1].len(), 4);
    }

    #[test]
    fn rows_are_scanned_independently() {
        let mut data = vec![0.0; 2 * 6];
        // Row 0 holds one tone, row 1 another; both should survive.
        for frame in 0..4 {
            data[frame] = 261.6;
            data[6 + frame] = 523.3;
        }
        let grid = PitchGrid::new(2, 6, data);
        let segments = extract_segments(&grid, &params(), 1024.0);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn all_zero_grid_yields_no_segments() {
        let grid = PitchGrid::new(3, 8, vec![0.0; 24]);
        assert!(extract_segments(&grid, &params(), 1024.0).is_empty());
    }

    #[test]
    fn degenerate_grid_yields_no_segments() {
        let grid = PitchGrid::new(0, 0, vec![]);
        assert!(extract_segments(&grid, &params(), 1024.0).is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let grid = single_row_grid(vec![440.0, 441.0, 440.5, 0.0, 330.0, 331.0, 330.5, 330.2]);
        let first = extract_segments(&grid, &params(), 1024.0);
        let second = extract_segments(&grid, &params(), 1024.0);
        assert_eq!(first, second);
    }

    #[test]
    fn segment_invariants_hold() {
        let grid = single_row_grid(vec![440.0, 441.0, 440.5, 439.8, 0.0, 330.0, 330.5, 331.0]);
        let p = params();
        for segment in extract_segments(&grid, &p, 1024.0) {
            assert_eq!(segment.times().len(), segment.frequencies().len());
            assert!(segment.len() >= p.min_pitch_frames);
            assert!(segment.frequencies()[0] < 1024.0);
            assert!(segment.times().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    #[should_panic(expected = "parallel")]
    fn mismatched_segment_buffers_panic() {
        ToneSegment::new(vec![0.0, 0.1], vec![440.0]);
    }
}
