use std::path::Path;

use crate::media::domain::crop_writer::CropWriter;
use crate::shared::frame::Frame;

/// Writes crops to image files using the `image` crate. The format follows
/// the file extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CropWriter for ImageFileWriter {
    fn write(&self, path: &Path, crop: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if crop.is_empty() {
            return Err("Cannot write an empty crop".into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = crop
            .to_rgb_image()
            .ok_or("Failed to create image from crop data")?;
        img.save(path)?;
        Ok(())
    }
}
