pub mod detection;
pub mod error;
pub mod scale;
pub mod traits;

pub use detection::{Detection, DetectionBatch, DetectionColor, DEFAULT_CONFIDENCE};
pub use error::SignVisionError;
pub use scale::CoordinateScale;
pub use traits::{ImageInput, ModelInfo, VisionModel, VisionReply, VisionRequest};
