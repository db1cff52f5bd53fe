//! Response normalization: free-form model text in, bounded `DetectionBatch` out.
//!
//! The normalizer never fails. A reply that cannot be read produces the same
//! empty batch as a reply that reports nothing; the difference is visible only
//! in the returned `NormalizationReport` and the log.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use signvision_core::{CoordinateScale, Detection, DetectionBatch};
use tracing::{debug, error, info, warn};

use crate::extract::json_candidates;
use crate::fence::strip_code_fence;
use crate::record::detection_from_record;

/// Default cap on detections kept from a single reply.
pub const DEFAULT_MAX_DETECTIONS: usize = 50;

/// How a reply was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeOutcome {
    /// JSON found and at least one candidate record examined.
    Parsed,
    /// Empty reply, `[]`, or an empty `detections` list.
    NothingDetected,
    /// No usable JSON in the reply.
    Unparseable,
    /// Normalization panicked and was contained.
    Recovered,
}

/// Side channel describing one normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub outcome: NormalizeOutcome,
    pub candidates: usize,
    pub accepted: usize,
    pub skipped: usize,
    /// Valid records dropped by the detection cap.
    pub truncated: usize,
}

impl NormalizationReport {
    fn empty(outcome: NormalizeOutcome) -> Self {
        Self {
            outcome,
            candidates: 0,
            accepted: 0,
            skipped: 0,
            truncated: 0,
        }
    }
}

/// Converts raw model replies into validated detections.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    max_detections: usize,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self {
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }

    pub fn with_max_detections(mut self, max: usize) -> Self {
        self.max_detections = max;
        self
    }

    pub fn max_detections(&self) -> usize {
        self.max_detections
    }

    /// Normalize a reply. `started` should be taken before the model call.
    pub fn normalize(&self, raw: &str, scale: CoordinateScale, started: Instant) -> DetectionBatch {
        self.normalize_with_report(raw, scale, started).0
    }

    /// Normalize a reply and also return how it was read.
    pub fn normalize_with_report(
        &self,
        raw: &str,
        scale: CoordinateScale,
        started: Instant,
    ) -> (DetectionBatch, NormalizationReport) {
        let (detections, report) =
            match panic::catch_unwind(AssertUnwindSafe(|| self.extract(raw, scale))) {
                Ok(result) => result,
                Err(_) => {
                    error!(reply_len = raw.len(), "Normalization panicked; returning no detections");
                    (Vec::new(), NormalizationReport::empty(NormalizeOutcome::Recovered))
                }
            };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        log_report(&report, raw, elapsed_ms);

        (DetectionBatch::new(detections, elapsed_ms), report)
    }

    fn extract(&self, raw: &str, scale: CoordinateScale) -> (Vec<Detection>, NormalizationReport) {
        let cleaned = strip_code_fence(raw);
        if is_empty_marker(cleaned) {
            return (Vec::new(), NormalizationReport::empty(NormalizeOutcome::NothingDetected));
        }

        let records = match parse_records(cleaned)
            .or_else(|| fallback_records(cleaned))
            .or_else(|| fallback_records(raw))
        {
            Some(records) => records,
            None => return (Vec::new(), NormalizationReport::empty(NormalizeOutcome::Unparseable)),
        };

        if records.is_empty() {
            return (Vec::new(), NormalizationReport::empty(NormalizeOutcome::NothingDetected));
        }

        let mut report = NormalizationReport::empty(NormalizeOutcome::Parsed);
        report.candidates = records.len();

        let mut detections = Vec::with_capacity(records.len().min(self.max_detections));
        for (index, record) in records.iter().enumerate() {
            match detection_from_record(record, scale) {
                Ok(_) if detections.len() >= self.max_detections => report.truncated += 1,
                Ok(detection) => detections.push(detection),
                Err(reason) => {
                    report.skipped += 1;
                    debug!(index, reason = %reason, "Skipping detection record");
                }
            }
        }
        report.accepted = detections.len();

        (detections, report)
    }
}

fn is_empty_marker(text: &str) -> bool {
    text.is_empty() || text.chars().filter(|c| !c.is_whitespace()).eq("[]".chars())
}

/// Parse the whole text and pull out the record list.
fn parse_records(text: &str) -> Option<Vec<Value>> {
    serde_json::from_str::<Value>(text).ok().and_then(records_of)
}

/// Parse the embedded JSON spans that have a recognized shape.
///
/// Prose often quotes a bare number array such as a bbox before the real
/// payload, so the first span holding an object wins. An embedded `[]` is
/// still taken when nothing better exists.
fn fallback_records(text: &str) -> Option<Vec<Value>> {
    let mut first_parsed = None;
    for records in json_candidates(text).into_iter().filter_map(parse_records) {
        if records.iter().any(Value::is_object) {
            return Some(records);
        }
        first_parsed.get_or_insert(records);
    }
    first_parsed
}

/// Accept a root array, or an object holding the array under `detections`.
fn records_of(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(records) => Some(records),
        Value::Object(mut map) => match map.remove("detections") {
            Some(Value::Array(records)) => Some(records),
            _ => None,
        },
        _ => None,
    }
}

fn log_report(report: &NormalizationReport, raw: &str, elapsed_ms: f64) {
    match report.outcome {
        NormalizeOutcome::Parsed => info!(
            accepted = report.accepted,
            skipped = report.skipped,
            truncated = report.truncated,
            processing_time_ms = elapsed_ms,
            "Normalized model reply"
        ),
        NormalizeOutcome::NothingDetected => {
            info!(processing_time_ms = elapsed_ms, "Model reported no detections")
        }
        NormalizeOutcome::Unparseable => warn!(
            reply_len = raw.len(),
            reply_preview = %preview(raw),
            processing_time_ms = elapsed_ms,
            "Model reply contained no usable JSON"
        ),
        NormalizeOutcome::Recovered => {}
    }
}

fn preview(raw: &str) -> String {
    const PREVIEW_CHARS: usize = 120;
    let mut out: String = raw.chars().take(PREVIEW_CHARS).collect();
    if raw.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(raw: &str, scale: CoordinateScale) -> (DetectionBatch, NormalizationReport) {
        ResponseNormalizer::new().normalize_with_report(raw, scale, Instant::now())
    }

    #[test]
    fn fenced_empty_array_is_nothing_detected() {
        let (batch, report) = run("```json\n[]\n```", CoordinateScale::Unit);
        assert!(batch.is_empty());
        assert_eq!(report.outcome, NormalizeOutcome::NothingDetected);
    }

    #[test]
    fn bad_sibling_does_not_drop_batch() {
        let raw = r#"[{"label":"a","bbox":[1,1,1,1]},{"bbox":[1,1,1,1]},{"label":"b","bbox":[2,2,2,2]}]"#;
        let (batch, report) = run(raw, CoordinateScale::Percent);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.detections[0].label(), "a");
        assert_eq!(batch.detections[0].bbox(), [0.01, 0.01, 0.01, 0.01]);
        assert_eq!(batch.detections[1].label(), "b");
        assert_eq!(batch.detections[1].bbox(), [0.02, 0.02, 0.02, 0.02]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.candidates, 3);
    }

    #[test]
    fn out_of_range_percent_box_is_clamped() {
        let raw = r#"{"detections": [{"label": "sign", "bbox": [150, -10, 50, 50]}]}"#;
        let (batch, _) = run(raw, CoordinateScale::Percent);
        assert_eq!(batch.detections[0].bbox(), [1.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn bbox_in_prose_does_not_hide_payload() {
        let raw = r#"The stop sign is at [0.2, 0.1, 0.15, 0.15]: {"detections": [{"label": "stop_sign", "bbox": [0.2, 0.1, 0.15, 0.15]}]}"#;
        let (batch, report) = run(raw, CoordinateScale::Unit);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.detections[0].label(), "stop_sign");
        assert_eq!(batch.detections[0].bbox(), [0.2, 0.1, 0.15, 0.15]);
        assert_eq!(report.outcome, NormalizeOutcome::Parsed);
    }

    #[test]
    fn embedded_empty_array_is_nothing_detected() {
        let (batch, report) = run("No signs here: []", CoordinateScale::Unit);
        assert!(batch.is_empty());
        assert_eq!(report.outcome, NormalizeOutcome::NothingDetected);
    }

    #[test]
    fn prose_reply_is_unparseable_but_empty() {
        let (batch, report) = run("I cannot analyze this image.", CoordinateScale::Unit);
        assert!(batch.is_empty());
        assert_eq!(report.outcome, NormalizeOutcome::Unparseable);
    }

    #[test]
    fn empty_reply_is_nothing_detected() {
        let (batch, report) = run("   ", CoordinateScale::Unit);
        assert!(batch.is_empty());
        assert_eq!(report.outcome, NormalizeOutcome::NothingDetected);
    }

    #[test]
    fn confidence_defaults_and_rescales() {
        let raw = r#"[{"label":"a","bbox":[10,10,10,10]},{"label":"b","bbox":[10,10,10,10],"confidence":90}]"#;
        let (batch, _) = run(raw, CoordinateScale::Percent);
        assert_eq!(batch.detections[0].confidence(), 0.85);
        assert_eq!(batch.detections[1].confidence(), 0.9);
    }

    #[test]
    fn json_wrapped_in_prose_is_recovered() {
        let raw = "Sure! I found these:\n{\"detections\": [{\"label\": \"stop_sign\", \"bbox\": [0.2, 0.1, 0.15, 0.15], \"color\": \"red\"}]}\nLet me know.";
        let (batch, report) = run(raw, CoordinateScale::Unit);
        assert_eq!(report.outcome, NormalizeOutcome::Parsed);
        assert_eq!(batch.detections[0].label(), "stop_sign");
    }

    #[test]
    fn unterminated_fence_falls_back_to_span_search() {
        let raw = "```json\n[{\"label\": \"walk_signal\", \"bbox\": [0.5, 0.2, 0.1, 0.1], \"color\": \"green\"}]";
        let (batch, _) = run(raw, CoordinateScale::Unit);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.detections[0].label(), "walk_signal");
    }

    #[test]
    fn nested_detections_object_is_found() {
        let raw = r#"{"result": {"detections": [{"label": "crosswalk", "bbox": [0.1, 0.7, 0.3, 0.2]}]}}"#;
        let (batch, _) = run(raw, CoordinateScale::Unit);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn object_without_detections_is_unparseable() {
        let (batch, report) = run(r#"{"error": "blurry"}"#, CoordinateScale::Unit);
        assert!(batch.is_empty());
        assert_eq!(report.outcome, NormalizeOutcome::Unparseable);
    }

    #[test]
    fn cap_limits_batch_size() {
        let records: Vec<String> = (0..5)
            .map(|i| format!(r#"{{"label":"s{i}","bbox":[0,0,0.1,0.1]}}"#))
            .collect();
        let raw = format!("[{}]", records.join(","));
        let (batch, report) = ResponseNormalizer::new()
            .with_max_detections(3)
            .normalize_with_report(&raw, CoordinateScale::Unit, Instant::now());
        assert_eq!(batch.len(), 3);
        assert_eq!(report.truncated, 2);
    }

    #[test]
    fn output_is_bounded_for_valid_inputs() {
        let raw = r#"[{"label":"a","bbox":[-5,0.5,9,0.2],"confidence":-3},{"label":"b","bbox":[0.3,0.3]},{"label":"c","bbox":[0.9,1.1,0,0]}]"#;
        let (batch, _) = run(raw, CoordinateScale::Unit);
        assert!(batch.len() <= 3);
        for det in &batch.detections {
            assert!(det.bbox().iter().all(|v| (0.0..=1.0).contains(v)));
            assert!((0.0..=1.0).contains(&det.confidence()));
        }
    }

    #[test]
    fn processing_time_includes_time_before_normalization() {
        let started = Instant::now() - std::time::Duration::from_millis(250);
        let batch = ResponseNormalizer::new().normalize("[]", CoordinateScale::Unit, started);
        assert!(batch.processing_time_ms >= 250.0);
    }
}
