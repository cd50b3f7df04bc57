// verify-core/src/lib.rs

//! The core logic for the 432 Hz pitch-shift verifier.
//! This crate measures the dominant frequency of a captured buffer with
//! three independent estimators, folds them into a median consensus, and
//! grades the result against an expected target frequency. It is
//! completely headless and contains no file or terminal I/O.

pub mod buffer;
pub mod consensus;
pub mod error;
pub mod pitch;
pub mod signal;
pub mod spectrum;
pub mod units;

use serde::{Deserialize, Serialize};

pub use buffer::SampleBuffer;
pub use consensus::{ConsensusResult, Diagnosis, FrequencyEstimate, Verdict, VerdictResult};
pub use error::AnalysisError;

/// Frequency band the dominant pitch is expected to fall in.
///
/// 300 to 600 Hz brackets both 432 Hz and 440 Hz while rejecting
/// harmonics; other reference/target pairs tune it accordingly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, hz: f64) -> bool {
        hz >= self.low_hz && hz <= self.high_hz
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self {
            low_hz: 300.0,
            high_hz: 600.0,
        }
    }
}

/// Configuration for one analysis run.
///
/// Passed explicitly into [`analyze`] so arbitrary reference/target pairs
/// can be verified and tests never depend on process-wide state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Target frequency the pipeline under test should have produced.
    pub expected_hz: f64,
    /// Untransformed reference the shift starts from.
    pub reference_hz: f64,
    /// Allowed |consensus − expected| in Hz for a PASS.
    pub tolerance_hz: f64,
    /// Analysis window duration in seconds, clamped to the buffer length.
    pub window_secs: f64,
    /// Band filter for the spectral peak and autocorrelation lag searches.
    pub band: FrequencyBand,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            expected_hz: 432.0,
            reference_hz: 440.0,
            tolerance_hz: 2.0,
            window_secs: 2.0,
            band: FrequencyBand::default(),
        }
    }
}

impl AnalysisConfig {
    /// Rejects configurations no analysis should run with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let audible = 20.0..=20_000.0;
        if !audible.contains(&self.expected_hz) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "expected frequency {} Hz is outside the audible range",
                self.expected_hz
            )));
        }
        if !audible.contains(&self.reference_hz) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "reference frequency {} Hz is outside the audible range",
                self.reference_hz
            )));
        }
        if self.tolerance_hz <= 0.0 {
            return Err(AnalysisError::InvalidConfiguration(
                "tolerance must be positive".into(),
            ));
        }
        if self.window_secs <= 0.0 {
            return Err(AnalysisError::InvalidConfiguration(
                "analysis window must be positive".into(),
            ));
        }
        if self.band.low_hz <= 0.0 || self.band.low_hz >= self.band.high_hz {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "band {}..{} Hz is not a valid range",
                self.band.low_hz, self.band.high_hz
            )));
        }
        Ok(())
    }
}

/// Runs the full multi-method analysis over one buffer.
///
/// Each estimator runs independently; a method that detects nothing is
/// logged and excluded rather than failing the run. The call is pure and
/// stateless, so distinct buffers may be analyzed from parallel threads
/// with no coordination.
///
/// # Errors
/// * `InvalidConfiguration` - the configuration failed validation
///   (buffer-level problems are rejected earlier, by [`SampleBuffer::new`])
pub fn analyze(
    buffer: &SampleBuffer,
    config: &AnalysisConfig,
) -> Result<VerdictResult, AnalysisError> {
    config.validate()?;

    let mut estimates = Vec::new();
    for estimator in pitch::default_estimators() {
        match estimator.estimate(buffer, config) {
            Some(hz) => {
                log::debug!("[analysis] {}: {:.3} Hz", estimator.name(), hz);
                estimates.push(FrequencyEstimate::new(
                    estimator.name(),
                    hz,
                    config.reference_hz,
                ));
            }
            None => {
                log::warn!(
                    "[analysis] {}: no detection, excluded from consensus",
                    estimator.name()
                );
            }
        }
    }

    Ok(consensus::run_consensus(
        estimates,
        config,
        buffer.sample_rate(),
        buffer.duration_secs(),
    ))
}
