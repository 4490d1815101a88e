//! # Analysis Configuration
//!
//! All tunable parameters of the analysis pipeline live in one immutable
//! [`AnalysisParams`] value that is passed by value into every entry point.
//! Nothing in the core reads ambient or global configuration; repeated
//! calls with the same parameters and the same input are guaranteed to
//! produce the same result.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Parameters for one analysis pass over an audio window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Sample rate the analysis runs at, in Hz.
    pub sample_rate: u32,
    /// FFT size in samples. The window is zero-padded up to this length.
    pub n_fft: usize,
    /// Analysis window length in samples.
    pub win_length: usize,
    /// Hop between successive analysis frames, in samples.
    pub hop_length: usize,
    /// Lower edge of the analysis band, in Hz.
    pub min_freq: f32,
    /// Upper edge of the analysis band, in Hz. Doubles as the frequency
    /// ceiling applied to tone segments.
    pub max_freq: f32,
    /// Minimum number of consecutive frames a pitch candidate must span
    /// before it counts as a tone segment.
    pub min_pitch_frames: usize,
    /// Relative magnitude threshold for per-frame pitch candidates
    /// (fraction of the frame's peak magnitude).
    pub pitch_threshold: f32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            n_fft: 8192,
            win_length: 4096,
            hop_length: 256,
            min_freq: 128.0,
            max_freq: 1024.0,
            min_pitch_frames: 3,
            pitch_threshold: 0.2,
        }
    }
}

impl AnalysisParams {
    /// Checks the parameters for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.win_length > self.n_fft {
            return Err(AnalysisError::InvalidParams(format!(
                "win_length ({}) exceeds n_fft ({})",
                self.win_length, self.n_fft
            )));
        }
        if self.hop_length == 0 {
            return Err(AnalysisError::InvalidParams("hop_length must be > 0".into()));
        }
        if self.sample_rate == 0 {
            return Err(AnalysisError::InvalidParams("sample_rate must be > 0".into()));
        }
        if self.min_freq >= self.max_freq {
            return Err(AnalysisError::InvalidParams(format!(
                "min_freq ({}) must be below max_freq ({})",
                self.min_freq, self.max_freq
            )));
        }
        Ok(())
    }

    /// Returns a copy of the parameters adjusted to a file's native rate.
    pub fn with_sample_rate(self, sample_rate: u32) -> Self {
        Self { sample_rate, ..self }
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.n_fft as f32
    }

    /// Index of the first FFT bin inside the analysis band.
    pub fn min_bin(&self) -> usize {
        (self.min_freq / self.bin_width() + 0.5) as usize
    }

    /// Index one past the last FFT bin inside the analysis band.
    pub fn max_bin(&self) -> usize {
        (self.max_freq / self.bin_width() + 0.5) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        assert!(AnalysisParams::default().validate().is_ok());
    }

    #[test]
    fn window_longer_than_fft_is_rejected() {
        let params = AnalysisParams {
            n_fft: 1024,
            win_length: 2048,
            ..AnalysisParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(AnalysisError::InvalidParams(_))
        ));
    }

    #[test]
    fn band_bins_match_rounded_edges() {
        let params = AnalysisParams::default();
        // 22050 / 8192 ≈ 2.69 Hz per bin.
        assert_eq!(params.min_bin(), 48);
        assert_eq!(params.max_bin(), 380);
    }
}
