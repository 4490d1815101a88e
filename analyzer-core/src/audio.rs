//! # Audio Loading Module
//!
//! Reads WAV files into normalized mono sample buffers for analysis.
//!
//! ## Features
//! - 16/24/32-bit integer and 32-bit float WAV support via `hound`
//! - Mono mixdown by channel averaging
//! - Offset/duration windowing in seconds

use std::path::Path;

use log::debug;

use crate::error::{AnalysisError, Result};

/// A decoded audio window ready for analysis.
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Mono samples normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// The file's native sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioData {
    /// Duration of the window in seconds.
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Loads a WAV file, mixes it to mono and applies the requested window.
///
/// `offset` skips that many seconds from the start; `duration` limits the
/// window length (to end of file when `None`). An offset past the end of
/// the file yields an empty sample buffer, not an error; downstream
/// analysis then reports an empty population.
pub fn load_wav(path: &Path, offset: f32, duration: Option<f32>) -> Result<AudioData> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AnalysisError::UnsupportedFormat("zero channels".into()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mut samples: Vec<f32> = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    let skip = ((offset.max(0.0) * spec.sample_rate as f32) as usize).min(samples.len());
    samples.drain(..skip);
    if let Some(duration) = duration {
        let keep = (duration.max(0.0) * spec.sample_rate as f32) as usize;
        samples.truncate(keep);
    }

    debug!(
        "loaded {}: {} mono samples at {} Hz",
        path.display(),
        samples.len(),
        spec.sample_rate
    );

    Ok(AudioData {
        samples,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_wav(name: &str, channels: u16, seconds: f32) -> PathBuf {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let path = std::env::temp_dir().join(format!("analyzer-core-test-{}.wav", name));
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        let n = (8000.0 * seconds) as usize;
        for i in 0..n {
            let value = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8000.0).sin();
            for _ in 0..channels {
                writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn loads_mono_wav() {
        let path = write_test_wav("mono", 1, 1.0);
        let audio = load_wav(&path, 0.0, None).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples.len(), 8000);
        assert!((audio.duration() - 1.0).abs() < 1e-6);
        assert!(audio.samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn stereo_is_mixed_down() {
        let path = write_test_wav("stereo", 2, 0.5);
        let audio = load_wav(&path, 0.0, None).unwrap();
        assert_eq!(audio.samples.len(), 4000);
    }

    #[test]
    fn offset_and_duration_window_the_file() {
        let path = write_test_wav("window", 1, 1.0);
        let audio = load_wav(&path, 0.25, Some(0.5)).unwrap();
        assert_eq!(audio.samples.len(), 4000);
    }

    #[test]
    fn offset_past_end_yields_empty_buffer() {
        let path = write_test_wav("past-end", 1, 0.5);
        let audio = load_wav(&path, 10.0, None).unwrap();
        assert!(audio.samples.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_wav(Path::new("/nonexistent/file.wav"), 0.0, None);
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}
