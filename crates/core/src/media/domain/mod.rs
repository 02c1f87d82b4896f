pub mod crop_writer;
pub mod image_source;
