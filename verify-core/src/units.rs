//! # Musical Unit Conversion Module
//!
//! Converts measured frequencies into the musical units the reports use:
//! semitones and cents relative to a reference pitch, plus nearest-note
//! naming on the 88-key equal-temperament grid (A4 = 440 Hz).
//!
//! ## Features
//! - Hz to semitone / cent deviation for arbitrary reference frequencies
//! - 88-key note table (A0 to C8), computed once at startup
//! - Nearest-note lookup for human-readable report lines

use once_cell::sync::Lazy;

/// A single equal-temperament note with its name and frequency.
#[derive(Debug, Clone)]
struct Note {
    name: String,
    frequency: f64,
}

/// Statically computed notes for a standard 88-key piano (A0 to C8).
///
/// Frequencies follow equal temperament around A4 = 440 Hz, where A4 is
/// index 48: f = 440 · 2^((i − 48)/12).
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
    ];
    let mut notes = Vec::with_capacity(88);

    for i in 0..88 {
        let frequency = 440.0 * 2.0_f64.powf((i as f64 - 48.0) / 12.0);

        // A piano starts at A0; the octave number increments at each C.
        let note_index = i % 12;
        let octave = (i + 9) / 12;
        let name = format!("{}{}", NOTE_NAMES[note_index], octave);

        notes.push(Note { name, frequency });
    }
    notes
});

/// Deviation of `measured_hz` from `reference_hz` in semitones.
///
/// Positive values are sharp, negative flat. Non-positive inputs yield 0.0
/// rather than a NaN from the logarithm; callers filter non-detections out
/// before ever reaching this point.
pub fn semitones_from_hz(measured_hz: f64, reference_hz: f64) -> f64 {
    if measured_hz <= 0.0 || reference_hz <= 0.0 {
        return 0.0;
    }
    12.0 * (measured_hz / reference_hz).log2()
}

/// Deviation in cents (1/100 of a semitone).
pub fn cents_from_hz(measured_hz: f64, reference_hz: f64) -> f64 {
    semitones_from_hz(measured_hz, reference_hz) * 100.0
}

/// Finds the closest equal-temperament note to a given frequency.
///
/// # Arguments
/// * `freq_hz` - Input frequency in Hz
///
/// # Returns
/// * `(note_name, note_frequency)` - Closest note name and its frequency
pub fn nearest_note(freq_hz: f64) -> (String, f64) {
    let closest = NOTES
        .iter()
        .min_by(|a, b| {
            let diff_a = (a.frequency - freq_hz).abs();
            let diff_b = (b.frequency - freq_hz).abs();
            diff_a
                .partial_cmp(&diff_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("note table is never empty");

    (closest.name.clone(), closest.frequency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn semitone_shift_for_432_from_440() {
        // 12 · log2(432/440) ≈ -0.3164 semitones, the full-shift constant.
        assert_abs_diff_eq!(semitones_from_hz(432.0, 440.0), -0.3164, epsilon = 1e-4);
        assert_abs_diff_eq!(cents_from_hz(432.0, 440.0), -31.64, epsilon = 1e-2);
    }

    #[test]
    fn octave_is_twelve_semitones() {
        assert_abs_diff_eq!(semitones_from_hz(880.0, 440.0), 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cents_from_hz(220.0, 440.0), -1200.0, epsilon = 1e-9);
    }

    #[test]
    fn non_positive_inputs_yield_zero() {
        assert_eq!(semitones_from_hz(0.0, 440.0), 0.0);
        assert_eq!(semitones_from_hz(440.0, 0.0), 0.0);
        assert_eq!(semitones_from_hz(-432.0, 440.0), 0.0);
    }

    #[test]
    fn nearest_note_hits_a4() {
        let (name, freq) = nearest_note(440.0);
        assert_eq!(name, "A4");
        assert_abs_diff_eq!(freq, 440.0, epsilon = 1e-9);

        // 432 Hz is still closest to A4, just 31.6 cents flat.
        let (name, _) = nearest_note(432.0);
        assert_eq!(name, "A4");
    }

    #[test]
    fn nearest_note_edges() {
        let (low, _) = nearest_note(10.0);
        assert_eq!(low, "A0");
        let (high, _) = nearest_note(10_000.0);
        assert_eq!(high, "C8");
    }
}
