//! Turning vision-model replies into overlay detections.
//!
//! The `ResponseNormalizer` is the core: it reads whatever text the model
//! produced and always returns a well-formed, possibly empty, batch.
//! `SignAnalyzer` wires a prompt template, a `VisionModel`, and the normalizer
//! into the per-request pipeline.

pub mod analyzer;
pub mod extract;
pub mod fence;
pub mod normalizer;
pub mod prompt;
pub mod record;

pub use analyzer::SignAnalyzer;
pub use fence::strip_code_fence;
pub use normalizer::{
    DEFAULT_MAX_DETECTIONS, NormalizationReport, NormalizeOutcome, ResponseNormalizer,
};
pub use prompt::{PromptTemplate, PromptVariant};
pub use record::{RecordRejection, detection_from_record};
