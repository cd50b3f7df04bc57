//! # Test Signal Module
//!
//! Reference-tone generation for exercising the verification pipeline
//! without a captured file: a phase-continuous sine source plus a naive
//! linear-interpolation resampler that stands in for the pitch-shift
//! effect under test.

use crate::error::AnalysisError;

/// Generates phase-continuous sine-wave buffers.
///
/// Phase is carried across calls to `generate`, so successive buffers
/// concatenate into one seamless tone. An instance is cheap and single
/// threaded; create one per tone.
#[derive(Debug)]
pub struct SineGenerator {
    frequency_hz: f64,
    sample_rate: u32,
    amplitude: f32,
    phase_rad: f64,
    phase_increment: f64,
}

impl SineGenerator {
    /// Creates a generator for one tone.
    ///
    /// # Arguments
    /// * `frequency_hz` - Tone frequency, 0 < f < sample_rate/2
    /// * `sample_rate` - Sample rate in Hz
    /// * `amplitude` - Peak amplitude as a fraction of full scale [0, 1]
    ///
    /// # Errors
    /// * `InvalidConfiguration` - any parameter outside the ranges above
    pub fn new(frequency_hz: f64, sample_rate: u32, amplitude: f32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "sample rate must be positive".into(),
            ));
        }
        if frequency_hz <= 0.0 {
            return Err(AnalysisError::InvalidConfiguration(
                "tone frequency must be positive".into(),
            ));
        }
        if frequency_hz >= sample_rate as f64 / 2.0 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "tone frequency {frequency_hz} Hz is at or above Nyquist for {sample_rate} Hz"
            )));
        }
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(AnalysisError::InvalidConfiguration(
                "amplitude must be within [0, 1]".into(),
            ));
        }

        Ok(Self {
            frequency_hz,
            sample_rate,
            amplitude,
            phase_rad: 0.0,
            phase_increment: 2.0 * std::f64::consts::PI * frequency_hz / sample_rate as f64,
        })
    }

    /// Generates `frames` mono samples, advancing the phase accumulator.
    pub fn generate(&mut self, frames: usize) -> Vec<f32> {
        let amp = self.amplitude as f64;
        let mut out = Vec::with_capacity(frames);

        for _ in 0..frames {
            out.push((amp * self.phase_rad.sin()) as f32);

            self.phase_rad += self.phase_increment;
            // Wrap to keep precision over long renders.
            if self.phase_rad >= std::f64::consts::PI {
                self.phase_rad -= 2.0 * std::f64::consts::PI;
            }
        }

        out
    }

    /// Retunes the generator without resetting phase; the next buffer
    /// transitions smoothly.
    pub fn set_frequency(&mut self, frequency_hz: f64) {
        self.frequency_hz = frequency_hz;
        self.phase_increment = 2.0 * std::f64::consts::PI * frequency_hz / self.sample_rate as f64;
    }

    /// Resets the phase accumulator to zero.
    pub fn reset_phase(&mut self) {
        self.phase_rad = 0.0;
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Resamples a buffer by linear interpolation so every frequency in it
/// scales by `ratio`.
///
/// Reading the input at `ratio` steps per output sample is exactly what a
/// resampling pitch shifter does, so `resample_linear(tone_440, 432.0/440.0)`
/// produces the 432 Hz signal the verifier expects to see from a correctly
/// configured pipeline. Not production quality, but plenty for generating
/// verification inputs.
pub fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    assert!(ratio > 0.0, "resample ratio must be positive");
    if samples.len() < 2 {
        return samples.to_vec();
    }

    let out_len = ((samples.len() - 1) as f64 / ratio).floor() as usize + 1;
    let mut out = Vec::with_capacity(out_len);

    for k in 0..out_len {
        let pos = k as f64 * ratio;
        let idx = (pos as usize).min(samples.len() - 2);
        let frac = (pos - idx as f64) as f32;
        out.push(samples[idx] * (1.0 - frac) + samples[idx + 1] * frac);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_parameters() {
        assert!(SineGenerator::new(440.0, 0, 0.5).is_err());
        assert!(SineGenerator::new(0.0, 48_000, 0.5).is_err());
        assert!(SineGenerator::new(-1.0, 48_000, 0.5).is_err());
        assert!(SineGenerator::new(24_000.0, 48_000, 0.5).is_err());
        assert!(SineGenerator::new(440.0, 48_000, 1.5).is_err());
        assert!(SineGenerator::new(440.0, 48_000, -0.1).is_err());
    }

    #[test]
    fn amplitude_bounds_output() {
        let mut generator = SineGenerator::new(440.0, 48_000, 0.5).unwrap();
        let samples = generator.generate(48_000);
        let peak = samples.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()));
        assert!(peak <= 0.5 + 1e-6);
        assert!(peak > 0.49, "peak {peak} far below the requested amplitude");
    }

    #[test]
    fn phase_is_continuous_across_calls() {
        let mut split = SineGenerator::new(432.0, 48_000, 1.0).unwrap();
        let mut whole = SineGenerator::new(432.0, 48_000, 1.0).unwrap();

        let mut chunks = split.generate(1000);
        chunks.extend(split.generate(1000));
        let reference = whole.generate(2000);

        assert_eq!(chunks, reference);
    }

    #[test]
    fn generated_period_matches_frequency() {
        // 1000 Hz at 48 kHz: 48 samples per period, 10 periods in 480 samples.
        let mut generator = SineGenerator::new(1000.0, 48_000, 1.0).unwrap();
        let samples = generator.generate(480);
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] as f64) * (w[1] as f64) < 0.0)
            .count();
        // Two crossings per period, minus the edge effects.
        assert!((19..=21).contains(&crossings), "got {crossings} crossings");
    }

    #[test]
    fn resample_scales_length_inversely() {
        let mut generator = SineGenerator::new(440.0, 48_000, 1.0).unwrap();
        let samples = generator.generate(48_000);

        let shifted = resample_linear(&samples, 432.0 / 440.0);
        // Slowing the read-out lengthens the buffer by 440/432.
        let expected_len = (48_000.0 * 440.0 / 432.0) as usize;
        assert!((shifted.len() as i64 - expected_len as i64).abs() < 4);
    }

    #[test]
    fn unit_ratio_is_identity_shaped() {
        let mut generator = SineGenerator::new(432.0, 48_000, 1.0).unwrap();
        let samples = generator.generate(4_800);
        let same = resample_linear(&samples, 1.0);
        assert_eq!(same.len(), samples.len());
        for (a, b) in samples.iter().zip(&same) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
