//! # Consensus & Verdict Module
//!
//! Aggregates the per-method estimates for one buffer into a single robust
//! measurement and grades it against the expected target frequency. The
//! median keeps one misbehaving estimator from dragging the result; zero
//! usable estimates produce an ERROR verdict rather than a fabricated
//! number.

use serde::Serialize;
use std::fmt;

use crate::AnalysisConfig;
use crate::units;

/// One estimator's successful measurement, tagged for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyEstimate {
    pub method: String,
    pub measured_hz: f64,
    /// Deviation from the untransformed reference in semitones.
    pub semitones: f64,
    /// Same deviation in cents.
    pub cents: f64,
}

impl FrequencyEstimate {
    pub fn new(method: &str, measured_hz: f64, reference_hz: f64) -> Self {
        Self {
            method: method.to_string(),
            measured_hz,
            semitones: units::semitones_from_hz(measured_hz, reference_hz),
            cents: units::cents_from_hz(measured_hz, reference_hz),
        }
    }
}

/// Final classification of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Consensus frequency within tolerance of the expected target.
    Pass,
    /// Pitch measured, but outside tolerance.
    Fail,
    /// No method produced a usable measurement.
    Error,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Error => write!(f, "ERROR"),
        }
    }
}

/// Most likely explanation for a FAIL. Diagnostic guidance only; it never
/// influences the verdict itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    /// Consensus still sits at the reference pitch: the shift was most
    /// likely never applied.
    ShiftLikelyInactive,
    /// The pitch moved, but not onto the expected target.
    ShiftRatioIncorrect,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::ShiftLikelyInactive => {
                write!(f, "pitch shift may not be active, check module installation")
            }
            Diagnosis::ShiftRatioIncorrect => {
                write!(f, "pitch shift active but ratio incorrect, check configuration")
            }
        }
    }
}

/// The consensus measurement and its derived musical metrics.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusResult {
    /// Median of all successful per-method estimates.
    pub measured_hz: f64,
    /// |consensus − reference|, how far the pitch moved at all.
    pub shift_from_reference_hz: f64,
    /// |consensus − expected|, how far it landed from the target.
    pub error_from_expected_hz: f64,
    /// Deviation from the reference in semitones.
    pub semitones: f64,
    /// Same deviation in cents.
    pub cents: f64,
    /// The theoretical shift in semitones: 12 · log2(expected/reference).
    pub expected_semitones: f64,
    /// The theoretical frequency ratio: expected/reference.
    pub expected_ratio: f64,
    /// Nearest equal-temperament note to the consensus, for report flavor.
    pub nearest_note: String,
}

/// The complete, immutable outcome of one analysis run.
///
/// Assembled once, then handed to reporting collaborators as a value; it
/// holds no references back into the sample buffer.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictResult {
    pub verdict: Verdict,
    pub expected_hz: f64,
    pub reference_hz: f64,
    pub tolerance_hz: f64,
    pub sample_rate: u32,
    pub duration_secs: f64,
    /// Every method that produced a usable estimate.
    pub estimates: Vec<FrequencyEstimate>,
    /// Absent when the verdict is ERROR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusResult>,
    /// Present only on FAIL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
    /// Present only on ERROR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Median with the usual even-count convention (mean of the middle pair).
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

/// Builds the verdict for one buffer from its surviving estimates.
///
/// # Arguments
/// * `estimates` - All successful per-method measurements (may be empty)
/// * `config` - The expected/reference/tolerance configuration
/// * `sample_rate` - Rate of the analyzed buffer, echoed into the report
/// * `duration_secs` - Length of the analyzed buffer, echoed into the report
pub fn run_consensus(
    estimates: Vec<FrequencyEstimate>,
    config: &AnalysisConfig,
    sample_rate: u32,
    duration_secs: f64,
) -> VerdictResult {
    let mut result = VerdictResult {
        verdict: Verdict::Error,
        expected_hz: config.expected_hz,
        reference_hz: config.reference_hz,
        tolerance_hz: config.tolerance_hz,
        sample_rate,
        duration_secs,
        estimates,
        consensus: None,
        diagnosis: None,
        error: None,
    };

    if result.estimates.is_empty() {
        log::warn!("[consensus] no pitch measurements succeeded");
        result.error = Some("no pitch measurements succeeded".to_string());
        return result;
    }

    let mut values: Vec<f64> = result.estimates.iter().map(|e| e.measured_hz).collect();
    let measured_hz = median(&mut values);

    let error_from_expected_hz = (measured_hz - config.expected_hz).abs();
    let (nearest_note, _) = units::nearest_note(measured_hz);

    result.consensus = Some(ConsensusResult {
        measured_hz,
        shift_from_reference_hz: (measured_hz - config.reference_hz).abs(),
        error_from_expected_hz,
        semitones: units::semitones_from_hz(measured_hz, config.reference_hz),
        cents: units::cents_from_hz(measured_hz, config.reference_hz),
        expected_semitones: units::semitones_from_hz(config.expected_hz, config.reference_hz),
        expected_ratio: config.expected_hz / config.reference_hz,
        nearest_note,
    });

    if error_from_expected_hz <= config.tolerance_hz {
        result.verdict = Verdict::Pass;
    } else {
        result.verdict = Verdict::Fail;
        // Within 2 Hz of the untransformed reference means the pitch never
        // moved; anything else means it moved to the wrong place.
        result.diagnosis = Some(if measured_hz > config.reference_hz - 2.0 {
            Diagnosis::ShiftLikelyInactive
        } else {
            Diagnosis::ShiftRatioIncorrect
        });
    }

    log::debug!(
        "[consensus] {:.3} Hz from {} estimate(s), verdict {}",
        measured_hz,
        result.estimates.len(),
        result.verdict
    );

    result
}
