//! # Pitch Estimation Module
//!
//! Three independent frequency estimators behind one strategy trait. Each
//! method measures the same buffer a different way, so a systematic error
//! in one path (windowing artifacts, lag quantization, waveform asymmetry)
//! cannot silently skew the final verdict: the consensus engine takes the
//! median of whatever subset succeeded.
//!
//! ## Methods
//! - Windowed-FFT peak with sub-bin quadratic interpolation (primary)
//! - Autocorrelation via the power spectrum (Wiener-Khinchin theorem)
//! - Zero-crossing counting, coarse but fully FFT-independent

use rustfft::{FftPlanner, num_complex::Complex};

use crate::AnalysisConfig;
use crate::buffer::SampleBuffer;
use crate::spectrum;

/// A pluggable frequency-estimation strategy.
///
/// `None` means "no detection": silence, an out-of-range lag window, or a
/// degenerate signal. It is not an error and never maps to 0.0 Hz; the
/// consensus engine simply excludes the method from the median.
pub trait FrequencyEstimator {
    /// Short method name used in reports and logs.
    fn name(&self) -> &'static str;

    /// Estimates the dominant frequency of `buffer` in Hz.
    fn estimate(&self, buffer: &SampleBuffer, config: &AnalysisConfig) -> Option<f64>;
}

/// The default closed set of estimators, in reporting order.
///
/// Further methods (a probabilistic-YIN tracker, for instance) can be added
/// alongside these without touching the consensus engine.
pub fn default_estimators() -> Vec<Box<dyn FrequencyEstimator>> {
    vec![
        Box::new(SpectralPeakEstimator),
        Box::new(AutocorrelationEstimator),
        Box::new(ZeroCrossingEstimator),
    ]
}

/// Windowed-FFT magnitude peak, refined below bin width.
///
/// The most precise of the three methods for clean tones; accuracy is
/// bounded by the parabolic fit rather than the bin resolution.
pub struct SpectralPeakEstimator;

impl FrequencyEstimator for SpectralPeakEstimator {
    fn name(&self) -> &'static str {
        "fft_peak"
    }

    fn estimate(&self, buffer: &SampleBuffer, config: &AnalysisConfig) -> Option<f64> {
        let spectrum = spectrum::compute_spectrum(buffer, config.window_secs);
        spectrum::refine_peak(&spectrum, Some(config.band)).map(|peak| peak.frequency_hz)
    }
}

/// Periodicity detection through the autocorrelation function.
///
/// The ACF is computed as inverse-FFT of the power spectrum rather than by
/// direct O(N²) correlation; the peak is searched only over lags that map
/// into the configured frequency band.
pub struct AutocorrelationEstimator;

impl FrequencyEstimator for AutocorrelationEstimator {
    fn name(&self) -> &'static str {
        "autocorrelation"
    }

    fn estimate(&self, buffer: &SampleBuffer, config: &AnalysisConfig) -> Option<f64> {
        let sample_rate = buffer.sample_rate() as f64;
        let n = ((config.window_secs * sample_rate) as usize).clamp(1, buffer.len());

        // Lag window for the expected band. Lag 0 is the energy peak and
        // must never win the search.
        let lag_min = ((sample_rate / config.band.high_hz) as usize).max(1);
        let lag_max = (sample_rate / config.band.low_hz) as usize;
        if lag_min >= lag_max || lag_max >= n {
            return None;
        }

        // Wiener-Khinchin: transform, multiply by the conjugate, transform
        // back. Padding to at least 2N keeps the correlation linear instead
        // of circular.
        let fft_size = (2 * n).next_power_of_two();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        let mut bins: Vec<Complex<f64>> = buffer.samples()[..n]
            .iter()
            .map(|&s| Complex {
                re: s as f64,
                im: 0.0,
            })
            .collect();
        bins.resize(fft_size, Complex { re: 0.0, im: 0.0 });

        forward.process(&mut bins);
        for bin in bins.iter_mut() {
            *bin = *bin * bin.conj();
        }
        inverse.process(&mut bins);

        // Real, non-negative-lag half. The inverse transform is unscaled,
        // which cannot move the argmax.
        let peak_lag = (lag_min..lag_max).max_by(|&a, &b| {
            bins[a]
                .re
                .partial_cmp(&bins[b].re)
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        // A silent buffer autocorrelates to zero everywhere.
        if bins[peak_lag].re <= 0.0 {
            return None;
        }

        Some(sample_rate / peak_lag as f64)
    }
}

/// Sign-change counting over the whole capture.
///
/// Accurate to roughly 2 Hz on clean tones. Kept in the set purely as an
/// FFT-independent cross-check; the consensus median prevents it from
/// dominating the better estimators.
pub struct ZeroCrossingEstimator;

impl FrequencyEstimator for ZeroCrossingEstimator {
    fn name(&self) -> &'static str {
        "zero_crossing"
    }

    fn estimate(&self, buffer: &SampleBuffer, _config: &AnalysisConfig) -> Option<f64> {
        let samples = buffer.samples();

        let mut count: usize = 0;
        let mut first: Option<usize> = None;
        let mut last: usize = 0;
        for i in 0..samples.len().saturating_sub(1) {
            // Strict sign change; products are taken in f64 so very quiet
            // signals do not underflow to zero at the crossing.
            if (samples[i] as f64) * (samples[i + 1] as f64) < 0.0 {
                count += 1;
                if first.is_none() {
                    first = Some(i);
                }
                last = i;
            }
        }

        let first = first?;
        if count < 2 {
            return None;
        }

        let span_secs = (last - first) as f64 / buffer.sample_rate() as f64;
        if span_secs <= 0.0 {
            return None;
        }

        // Two crossings per period; the span runs first to last crossing.
        Some((count as f64 - 1.0) / (2.0 * span_secs))
    }
}
