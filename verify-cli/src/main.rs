//! # verify432 - 432 Hz Pitch-Shift Verification CLI
//!
//! Loads one or more captured WAV files, runs the multi-method frequency
//! analysis from `verify-core` on each, prints a per-file report, and
//! optionally writes the whole batch as JSON.
//!
//! ## Architecture
//! - **Main thread**: argument parsing, report printing, exit code
//! - **Worker threads**: one analysis per input file; results come back
//!   over a crossbeam channel (analyses share nothing, so no coordination)
//!
//! Exit code 0 means every verdict was PASS; anything else is 1.

mod report;
mod wav;

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::unbounded;
use verify_core::signal::{SineGenerator, resample_linear};
use verify_core::{AnalysisConfig, FrequencyBand, SampleBuffer, VerdictResult, analyze};

#[derive(Parser, Debug)]
#[command(
    name = "verify432",
    version,
    about = "Verify that an audio pipeline pitch-shifted its output to the expected frequency"
)]
struct Args {
    /// Captured audio files to analyze (.wav)
    #[arg(required_unless_present = "selftest")]
    inputs: Vec<PathBuf>,

    /// Expected output frequency in Hz
    #[arg(long, default_value_t = 432.0)]
    expected: f64,

    /// Untransformed reference frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    reference: f64,

    /// Pass/fail tolerance in Hz
    #[arg(long, default_value_t = 2.0)]
    tolerance: f64,

    /// Analysis window duration in seconds
    #[arg(long, default_value_t = 2.0)]
    window_secs: f64,

    /// Lower edge of the pitch search band in Hz
    #[arg(long, default_value_t = 300.0)]
    band_low: f64,

    /// Upper edge of the pitch search band in Hz
    #[arg(long, default_value_t = 600.0)]
    band_high: f64,

    /// Save a JSON report of all results to this path
    #[arg(long, short)]
    report: Option<PathBuf>,

    /// Generate a shifted reference tone internally and verify it,
    /// exercising the whole pipeline without a capture file
    #[arg(long)]
    selftest: bool,
}

impl Args {
    fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            expected_hz: self.expected,
            reference_hz: self.reference,
            tolerance_hz: self.tolerance,
            window_secs: self.window_secs,
            band: FrequencyBand::new(self.band_low, self.band_high),
        }
    }
}

/// Loads and analyzes one capture.
fn analyze_file(path: &PathBuf, config: &AnalysisConfig) -> Result<VerdictResult> {
    let decoded = wav::load_wav(path)?;
    let buffer = SampleBuffer::new(decoded.samples, decoded.sample_rate)?;
    Ok(analyze(&buffer, config)?)
}

/// Synthesizes the reference tone, shifts it by expected/reference, and
/// runs the verifier on the result. A healthy build always passes.
fn analyze_selftest(config: &AnalysisConfig) -> Result<VerdictResult> {
    const SAMPLE_RATE: u32 = 48_000;

    log::info!(
        "[selftest] {} Hz tone shifted by {:.6}",
        config.reference_hz,
        config.expected_hz / config.reference_hz
    );

    let mut generator = SineGenerator::new(config.reference_hz, SAMPLE_RATE, 0.8)?;
    let tone = generator.generate(SAMPLE_RATE as usize * 2);
    let shifted = resample_linear(&tone, config.expected_hz / config.reference_hz);

    let buffer = SampleBuffer::new(shifted, SAMPLE_RATE)?;
    Ok(analyze(&buffer, config)?)
}

/// Fans the input files out across worker threads.
///
/// Every analysis reads its own buffer and writes its own result, so the
/// only coordination is the channel collecting them. Results are reordered
/// to match the command line before printing.
fn analyze_all(inputs: &[PathBuf], config: &AnalysisConfig) -> Vec<(String, Result<VerdictResult>)> {
    let (sender, receiver) = unbounded();

    thread::scope(|scope| {
        for (index, path) in inputs.iter().enumerate() {
            let sender = sender.clone();
            scope.spawn(move || {
                let result = analyze_file(path, config);
                // The receiver outlives every worker; a send cannot fail.
                let _ = sender.send((index, result));
            });
        }
    });
    drop(sender);

    let mut collected: Vec<(usize, Result<VerdictResult>)> = receiver.iter().collect();
    collected.sort_by_key(|(index, _)| *index);

    collected
        .into_iter()
        .map(|(index, result)| (inputs[index].display().to_string(), result))
        .collect()
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let config = args.config();
    config.validate()?;

    let mut results: Vec<(String, Result<VerdictResult>)> = Vec::new();
    if args.selftest {
        results.push(("selftest".to_string(), analyze_selftest(&config)));
    }
    match args.inputs.len() {
        0 => {}
        1 => {
            let path = &args.inputs[0];
            results.push((path.display().to_string(), analyze_file(path, &config)));
        }
        _ => results.extend(analyze_all(&args.inputs, &config)),
    }

    let mut all_pass = !results.is_empty();
    let mut reportable: Vec<(String, VerdictResult)> = Vec::new();

    for (name, result) in results {
        match result {
            Ok(verdict) => {
                report::print_human(&name, &verdict);
                if !verdict.verdict.is_pass() {
                    all_pass = false;
                }
                reportable.push((name, verdict));
            }
            Err(error) => {
                log::error!("[main] {name}: {error:#}");
                eprintln!("{name}: {error:#}");
                all_pass = false;
            }
        }
    }

    if let Some(path) = &args.report {
        report::write_json(path, &reportable)?;
    }

    Ok(ExitCode::from(if all_pass { 0 } else { 1 }))
}
