//! CLI Normalize Command
//!
//! Runs the response normalizer offline over a saved model reply.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use signvision_core::{CoordinateScale, DetectionBatch};
use signvision_understanding::{NormalizationReport, ResponseNormalizer};

/// Read the reply from `file`, or stdin when absent.
fn read_reply(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

pub fn normalize_text(
    raw: &str,
    scale: CoordinateScale,
    max_detections: usize,
) -> (DetectionBatch, NormalizationReport) {
    ResponseNormalizer::new()
        .with_max_detections(max_detections)
        .normalize_with_report(raw, scale, Instant::now())
}

pub fn run(file: Option<&Path>, scale: CoordinateScale, max_detections: usize) -> Result<()> {
    let raw = read_reply(file)?;
    let (batch, report) = normalize_text(&raw, scale, max_detections);
    eprintln!(
        "outcome: {:?}, candidates: {}, accepted: {}, skipped: {}",
        report.outcome, report.candidates, report.accepted, report.skipped
    );
    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}
