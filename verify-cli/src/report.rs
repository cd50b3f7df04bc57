//! Report output: the human-readable summary on stdout and the optional
//! JSON file for scripted consumers. Both render the same `VerdictResult`
//! value; nothing here re-derives any number.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use verify_core::{Verdict, VerdictResult};

const GREEN_BOLD: &str = "\x1b[1;32m";
const RED_BOLD: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Prints the per-method table, consensus block, and verdict banner.
pub fn print_human(name: &str, result: &VerdictResult) {
    println!("\n{name}: {} Hz, {:.2} s", result.sample_rate, result.duration_secs);

    for estimate in &result.estimates {
        println!(
            "  {:<16} {:>9.2} Hz  ({:+.4} semitones, {:+.1}\u{00a2})",
            estimate.method, estimate.measured_hz, estimate.semitones, estimate.cents
        );
    }

    match (&result.consensus, &result.error) {
        (Some(consensus), _) => {
            println!("  -------------------------------------------------");
            println!(
                "  Consensus:      {:>9.2} Hz  (nearest note {})",
                consensus.measured_hz, consensus.nearest_note
            );
            println!("  Expected:       {:>9.2} Hz", result.expected_hz);
            println!(
                "  Error:          {:>9.3} Hz  (tolerance \u{00b1}{} Hz)",
                consensus.error_from_expected_hz, result.tolerance_hz
            );
            println!(
                "  Shift:          {:+.4} semitones  ({:+.1}\u{00a2})",
                consensus.semitones, consensus.cents
            );
            println!(
                "  Expected shift: {:+.4} semitones  (ratio {:.6})",
                consensus.expected_semitones, consensus.expected_ratio
            );
            println!("  -------------------------------------------------");
        }
        (None, Some(message)) => println!("  no consensus: {message}"),
        (None, None) => {}
    }

    match result.verdict {
        Verdict::Pass => {
            println!(
                "\n  {GREEN_BOLD}\u{2713} PASS - {:.0} Hz pitch shift verified{RESET}",
                result.expected_hz
            );
        }
        Verdict::Fail => {
            let measured = result
                .consensus
                .as_ref()
                .map(|c| c.measured_hz)
                .unwrap_or_default();
            println!(
                "\n  {RED_BOLD}\u{2717} FAIL - measured {measured:.2} Hz, expected {:.2} \u{00b1} {} Hz{RESET}",
                result.expected_hz, result.tolerance_hz
            );
            if let Some(diagnosis) = result.diagnosis {
                println!("         {diagnosis}");
            }
        }
        Verdict::Error => {
            println!("\n  {RED_BOLD}\u{2717} ERROR - no usable measurement{RESET}");
        }
    }
}

/// Writes the full result as pretty-printed JSON.
pub fn write_json(path: &Path, results: &[(String, VerdictResult)]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create report file {}", path.display()))?;

    // One object per input file, keyed the way the summary prints them.
    let report: serde_json::Map<String, serde_json::Value> = results
        .iter()
        .map(|(name, result)| {
            Ok((name.clone(), serde_json::to_value(result)?))
        })
        .collect::<Result<_>>()?;

    serde_json::to_writer_pretty(BufWriter::new(file), &report)
        .with_context(|| format!("cannot write report to {}", path.display()))?;
    log::info!("[report] saved {}", path.display());
    Ok(())
}
