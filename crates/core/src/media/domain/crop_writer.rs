use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a diagnostic face crop.
pub trait CropWriter: Send + Sync {
    fn write(&self, path: &Path, crop: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
