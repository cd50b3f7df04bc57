//! WAV loading for the verifier.
//!
//! Decodes a capture with `hound`, averages interleaved channels down to
//! mono, and scales every sample format to [-1, 1] floats. Anything more
//! exotic than WAV should be converted before verification; the core is
//! format-agnostic and only ever sees the mono buffer.

use std::path::Path;

use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader};

/// Decoded mono audio: samples in [-1, 1] plus the sample rate.
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Reads a WAV file and mixes it down to mono.
pub fn load_wav(path: &Path) -> Result<DecodedAudio> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        bail!("{}: zero channels", path.display());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("decode error in {}", path.display()))?,
        SampleFormat::Int => {
            // Scale by full scale for the bit depth, matching the usual
            // int-to-float PCM convention (i16 divides by 32768).
            let full_scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("decode error in {}", path.display()))?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    log::info!(
        "[load] {}: {} Hz, {} ch, {:.2} s",
        path.display(),
        spec.sample_rate,
        channels,
        samples.len() as f64 / spec.sample_rate as f64
    );

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}
