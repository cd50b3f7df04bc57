//! Error types for the analysis pipeline.
//!
//! Only failures that abort an analysis outright live here. An individual
//! estimator that cannot produce a usable measurement returns `None` and is
//! excluded from the consensus; that is normal operation, not an error.

use thiserror::Error;

/// Failures that prevent an analysis from running at all.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The capture is shorter than the minimum analysis window.
    ///
    /// Truncating instead would silently degrade frequency resolution below
    /// what is needed to separate 432 Hz from 440 Hz.
    #[error(
        "input too short: {samples} samples, need at least {required} (0.1 s at {sample_rate} Hz)"
    )]
    InputTooShort {
        samples: usize,
        required: usize,
        sample_rate: u32,
    },

    /// A configuration value was rejected before analysis began.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
