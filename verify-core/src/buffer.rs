//! # Sample Buffer Module
//!
//! Owns one captured mono recording and its sample rate. The buffer is
//! immutable once constructed and every estimator borrows it read-only,
//! so analyses of distinct buffers can run on separate threads without
//! coordination.

use crate::error::AnalysisError;

/// Minimum capture duration in seconds.
///
/// Shorter windows cannot resolve the 8 Hz gap between 432 Hz and 440 Hz,
/// so they are rejected outright rather than analyzed inaccurately.
pub const MIN_DURATION_SECS: f64 = 0.1;

/// A mono audio capture: samples normalized to [-1, 1] plus the sample rate.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Creates a buffer, rejecting inputs the analysis cannot handle.
    ///
    /// # Arguments
    /// * `samples` - Mono samples in [-1, 1]
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    /// * `InvalidConfiguration` - the sample rate is zero
    /// * `InputTooShort` - less than 0.1 s of audio at the given rate
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "sample rate must be positive".into(),
            ));
        }
        let required = (sample_rate as f64 * MIN_DURATION_SECS).ceil() as usize;
        if samples.len() < required {
            return Err(AnalysisError::InputTooShort {
                samples: samples.len(),
                required,
                sample_rate,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
