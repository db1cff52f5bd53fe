use std::fmt;

use serde::{Deserialize, Serialize};

/// Confidence assigned to a detection whose reply carries none.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Advisory overlay color used by the renderer for visual severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectionColor {
    /// Hazards, stop and "don't walk" signs.
    Red,
    /// Caution.
    #[default]
    Yellow,
    /// Safe to proceed.
    Green,
    /// Informational.
    Blue,
    Orange,
}

impl DetectionColor {
    /// Case-insensitive lookup in the color vocabulary.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Self::Red),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            "orange" => Some(Self::Orange),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Orange => "orange",
        }
    }
}

impl fmt::Display for DetectionColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognized sign, signal, crosswalk, or hazard.
///
/// `bbox` is `[x, y, width, height]` as fractions of the image size.
/// Values are kept inside `[0, 1]` by construction and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    label: String,
    bbox: [f64; 4],
    color: DetectionColor,
    confidence: f64,
}

impl Detection {
    /// Build a detection, clamping the box and confidence into the unit range.
    pub fn new(label: impl Into<String>, bbox: [f64; 4], color: DetectionColor, confidence: f64) -> Self {
        Self {
            label: label.into(),
            bbox: bbox.map(unit_clamp),
            color,
            confidence: unit_clamp(confidence),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bbox(&self) -> [f64; 4] {
        self.bbox
    }

    pub fn color(&self) -> DetectionColor {
        self.color
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

fn unit_clamp(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// The response body of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionBatch {
    pub detections: Vec<Detection>,
    /// Wall-clock milliseconds from request start (model call included) to normalization end.
    pub processing_time_ms: f64,
}

impl DetectionBatch {
    pub fn new(detections: Vec<Detection>, processing_time_ms: f64) -> Self {
        Self {
            detections,
            processing_time_ms,
        }
    }

    pub fn empty(processing_time_ms: f64) -> Self {
        Self::new(Vec::new(), processing_time_ms)
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_clamps_into_unit_range() {
        let det = Detection::new("hazard", [1.5, -0.2, 0.3, f64::NAN], DetectionColor::Red, 4.0);
        assert_eq!(det.bbox(), [1.0, 0.0, 0.3, 0.0]);
        assert_eq!(det.confidence(), 1.0);
    }

    #[test]
    fn color_lookup_is_case_insensitive() {
        assert_eq!(DetectionColor::from_name(" Green"), Some(DetectionColor::Green));
        assert_eq!(DetectionColor::from_name("ORANGE"), Some(DetectionColor::Orange));
        assert_eq!(DetectionColor::from_name("purple"), None);
    }

    #[test]
    fn serializes_overlay_schema() {
        let batch = DetectionBatch::new(
            vec![Detection::new("stop_sign", [0.2, 0.1, 0.15, 0.15], DetectionColor::Red, 0.9)],
            12.5,
        );
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["detections"][0]["label"], "stop_sign");
        assert_eq!(json["detections"][0]["color"], "red");
        assert_eq!(json["detections"][0]["bbox"].as_array().unwrap().len(), 4);
        assert_eq!(json["processing_time_ms"], 12.5);
    }
}
