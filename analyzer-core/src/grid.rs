//! # Pitch Grid
//!
//! The pitch/magnitude detector reports one candidate frequency per
//! frequency bin per analysis frame. [`PitchGrid`] is the immutable 2-D
//! container for those readings: rows are frequency bins restricted to the
//! analysis band, columns are evenly spaced analysis frames, and `0.0`
//! means "no candidate at this bin/frame".
//!
//! Frame indices are converted to timestamps here as well, since the
//! grid's column spacing is what defines the timebase.

/// A per-bin, per-frame grid of pitch candidates in Hz.
///
/// Dimensions are fixed at construction and the contents never change; a
/// grid with zero rows or zero columns is valid and simply yields empty
/// results downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchGrid {
    bins: usize,
    frames: usize,
    data: Vec<f32>,
}

impl PitchGrid {
    /// Builds a grid from row-major data (`bins` rows of `frames` entries).
    ///
    /// # Panics
    /// If `data.len() != bins * frames`. A mismatched buffer is a
    /// programming error, not a recoverable condition.
    pub fn new(bins: usize, frames: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            bins * frames,
            "pitch grid data length must equal bins * frames"
        );
        Self { bins, frames, data }
    }

    /// Number of frequency-bin rows.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Number of analysis-frame columns.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// True when the grid has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.bins == 0 || self.frames == 0
    }

    /// The candidate frequency at `(bin, frame)`, `0.0` when none.
    pub fn value(&self, bin: usize, frame: usize) -> f32 {
        self.data[bin * self.frames + frame]
    }

    /// One full row of per-frame readings for a frequency bin.
    pub fn row(&self, bin: usize) -> &[f32] {
        let start = bin * self.frames;
        &self.data[start..start + self.frames]
    }
}

/// Converts a frame index to a timestamp in seconds.
pub fn frame_to_time(frame: usize, sample_rate: u32, hop_length: usize) -> f32 {
    (frame * hop_length) as f32 / sample_rate as f32
}

/// Converts a sequence of frame indices to timestamps in seconds.
pub fn frames_to_time(frames: &[usize], sample_rate: u32, hop_length: usize) -> Vec<f32> {
    frames
        .iter()
        .map(|&frame| frame_to_time(frame, sample_rate, hop_length))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_contiguous_frames() {
        let grid = PitchGrid::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(grid.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(grid.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(grid.value(1, 2), 6.0);
    }

    #[test]
    fn degenerate_grids_are_valid() {
        assert!(PitchGrid::new(0, 5, vec![]).is_empty());
        assert!(PitchGrid::new(5, 0, vec![]).is_empty());
    }

    #[test]
    #[should_panic(expected = "bins * frames")]
    fn mismatched_buffer_panics() {
        PitchGrid::new(2, 2, vec![0.0; 3]);
    }

    #[test]
    fn frame_times_follow_hop_duration() {
        // 256-sample hop at 22050 Hz ≈ 11.6 ms per frame.
        let times = frames_to_time(&[0, 1, 86], 22050, 256);
        assert_eq!(times[0], 0.0);
        assert!((times[1] - 0.011610).abs() < 1e-5);
        assert!((times[2] - 0.998458).abs() < 1e-5);
    }
}
