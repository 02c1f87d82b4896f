use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Readiness of a detector backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetectorStatus {
    Ready { trees: usize, depth: u32 },
    /// The backend failed to initialize; `detect` always returns nothing.
    Inert { reason: String },
}

impl DetectorStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, DetectorStatus::Ready { .. })
    }
}

/// Domain interface for face detection.
///
/// Detectors are loaded once and shared read-only across evaluations,
/// hence `&self` and `Sync`. An empty result means no face was found; it
/// is never an error.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Vec<Detection>;

    fn status(&self) -> DetectorStatus;
}
