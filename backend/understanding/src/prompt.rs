//! Prompt templates sent alongside each frame.
//!
//! A template pairs prompt text with the coordinate scale that text asks the
//! model to use, so the normalizer knows how to read the reply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use signvision_core::{CoordinateScale, SignVisionError};

const STREET_SCENE_PROMPT: &str = r#"Analyze this street scene image and detect the following:
1. Traffic signs (stop signs, no walk signs, walk signs, speed limits, etc.)
2. Crosswalk signals (walk/don't walk pedestrian signals)
3. Crosswalk markings (zebra stripes, painted crosswalks)
4. Potential hazards (obstacles, debris, pedestrians, vehicles)

For each detection, provide:
- label: a short description (e.g., "stop_sign", "no_walk", "crosswalk", "hazard")
- bbox: bounding box coordinates [x, y, width, height] normalized to 0-1
- color: "red" for hazards/no signs, "yellow" for caution, "green" for safe/proceed
- confidence: how sure you are, from 0 to 1

Return your response in this exact JSON format:
{
    "detections": [
        {"label": "stop_sign", "bbox": [0.2, 0.1, 0.15, 0.15], "color": "red", "confidence": 0.9},
        {"label": "crosswalk", "bbox": [0.1, 0.7, 0.3, 0.2], "color": "green", "confidence": 0.8}
    ]
}

If nothing is found, return {"detections": []}.
Only respond with the JSON object, no additional text."#;

const SIGNS_ONLY_PROMPT: &str = r#"Look at this photo taken by a pedestrian and find only traffic signs and pedestrian signals.
Ignore vehicles, people, and road markings.

For each sign or signal, provide:
- label: what it says or shows (e.g., "Stop", "Walk Signal - Green", "Don't Walk Signal - Red", "Speed Limit 25")
- bbox: [x, y, width, height] as percentages of the image size, each between 0 and 100
- color: "red" for stop/don't walk, "orange" for warnings, "yellow" for caution, "green" for walk/go, "blue" for information
- confidence: a percentage between 0 and 100

Return a JSON array and nothing else, for example:
[
    {"label": "Stop", "bbox": [42, 18, 12, 15], "color": "red", "confidence": 92}
]

If there are no signs, return []."#;

/// Built-in prompt variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PromptVariant {
    /// Signs, signals, crosswalks and hazards; unit coordinates.
    #[default]
    StreetScene,
    /// Signs and pedestrian signals only; percentage coordinates.
    SignsOnly,
}

impl PromptVariant {
    pub const ALL: [PromptVariant; 2] = [Self::StreetScene, Self::SignsOnly];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StreetScene => "street-scene",
            Self::SignsOnly => "signs-only",
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptVariant {
    type Err = SignVisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| {
                SignVisionError::ConfigError(format!(
                    "unknown prompt '{s}' (expected 'street-scene' or 'signs-only')"
                ))
            })
    }
}

/// Prompt text plus the coordinate scale it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: String,
    pub text: String,
    pub scale: CoordinateScale,
}

impl PromptTemplate {
    pub fn builtin(variant: PromptVariant) -> Self {
        let (text, scale) = match variant {
            PromptVariant::StreetScene => (STREET_SCENE_PROMPT, CoordinateScale::Unit),
            PromptVariant::SignsOnly => (SIGNS_ONLY_PROMPT, CoordinateScale::Percent),
        };
        Self {
            name: variant.as_str().to_string(),
            text: text.to_string(),
            scale,
        }
    }

    /// Look up a built-in template by name.
    pub fn named(name: &str) -> Result<Self, SignVisionError> {
        name.parse().map(Self::builtin)
    }

    /// Replace the prompt text, keeping the declared scale.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Override the scale replies are read with.
    pub fn with_scale(mut self, scale: CoordinateScale) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin(PromptVariant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_declare_their_scale() {
        assert_eq!(PromptTemplate::builtin(PromptVariant::StreetScene).scale, CoordinateScale::Unit);
        assert_eq!(PromptTemplate::builtin(PromptVariant::SignsOnly).scale, CoordinateScale::Percent);
    }

    #[test]
    fn named_lookup_accepts_underscores() {
        let template = PromptTemplate::named("SIGNS_ONLY").unwrap();
        assert_eq!(template.name, "signs-only");
        assert!(PromptTemplate::named("everything").is_err());
    }

    #[test]
    fn swapping_text_keeps_scale() {
        let template = PromptTemplate::named("signs-only").unwrap().with_text("custom");
        assert_eq!(template.text, "custom");
        assert_eq!(template.scale, CoordinateScale::Percent);
    }
}
