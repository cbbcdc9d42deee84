mod heading;
mod step_detector;

pub use heading::{normalize_bearing, HeadingConfig, HeadingEstimator};
pub use step_detector::{StepDetected, StepDetector, StepDetectorConfig};
