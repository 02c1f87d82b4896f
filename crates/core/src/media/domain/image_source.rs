use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes an image from storage into an RGB [`Frame`].
pub trait ImageSource {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
