//! Per-record validation: one JSON object in, one `Detection` or a rejection out.

use std::fmt;

use serde_json::Value;
use signvision_core::{CoordinateScale, DEFAULT_CONFIDENCE, Detection, DetectionColor};

/// Why a candidate record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    NotAnObject,
    MissingLabel,
    MissingBbox,
    /// Label present but not a non-empty string.
    InvalidLabel,
    BboxNotArray,
    BboxWrongLength(usize),
    BboxNotNumeric,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "record is not an object"),
            Self::MissingLabel => write!(f, "missing label"),
            Self::MissingBbox => write!(f, "missing bbox"),
            Self::InvalidLabel => write!(f, "label is not a non-empty string"),
            Self::BboxNotArray => write!(f, "bbox is not an array"),
            Self::BboxWrongLength(n) => write!(f, "bbox has {n} entries, expected 4"),
            Self::BboxNotNumeric => write!(f, "bbox contains a non-numeric entry"),
        }
    }
}

/// Turn one candidate object into a detection on the unit scale.
///
/// Box entries are clamped into the source range before rescaling. Color and
/// confidence fall back to defaults when absent or unusable.
pub fn detection_from_record(
    record: &Value,
    scale: CoordinateScale,
) -> Result<Detection, RecordRejection> {
    let obj = record.as_object().ok_or(RecordRejection::NotAnObject)?;

    let label = obj.get("label").ok_or(RecordRejection::MissingLabel)?;
    let bbox = obj.get("bbox").ok_or(RecordRejection::MissingBbox)?;

    let label = label
        .as_str()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(RecordRejection::InvalidLabel)?;

    let bbox = parse_bbox(bbox, scale)?;
    let color = obj
        .get("color")
        .and_then(Value::as_str)
        .and_then(DetectionColor::from_name)
        .unwrap_or_default();
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| normalize_confidence(c, scale))
        .unwrap_or(DEFAULT_CONFIDENCE);

    Ok(Detection::new(label, bbox, color, confidence))
}

fn parse_bbox(value: &Value, scale: CoordinateScale) -> Result<[f64; 4], RecordRejection> {
    let entries = value.as_array().ok_or(RecordRejection::BboxNotArray)?;
    if entries.len() != 4 {
        return Err(RecordRejection::BboxWrongLength(entries.len()));
    }

    let mut bbox = [0.0; 4];
    for (slot, entry) in bbox.iter_mut().zip(entries) {
        let raw = entry.as_f64().ok_or(RecordRejection::BboxNotNumeric)?;
        *slot = scale.to_unit(scale.clamp(raw));
    }
    Ok(bbox)
}

/// Confidence on the unit scale.
///
/// A value above 1 on the unit scale can only be a percentage and is read as one.
fn normalize_confidence(raw: f64, scale: CoordinateScale) -> f64 {
    let unit = match scale {
        CoordinateScale::Percent => raw / 100.0,
        CoordinateScale::Unit if raw > 1.0 => raw / 100.0,
        CoordinateScale::Unit => raw,
    };
    if unit.is_nan() { DEFAULT_CONFIDENCE } else { unit.clamp(0.0, 1.0) }
}
