/// File name of the pico-format frontal face cascade.
pub const CASCADE_FILE_NAME: &str = "facefinder";

/// Locations tried, in order, after any explicitly configured paths.
pub const DEFAULT_CASCADE_LOCATIONS: &[&str] = &["./facefinder", "./cascade/facefinder"];

/// Application directory name under the platform data directory.
pub const APP_DIR_NAME: &str = "watchguard";

pub const DEFAULT_MIN_SIZE: u32 = 32;
pub const DEFAULT_MAX_SIZE: u32 = 1000;
pub const DEFAULT_SHIFT_FACTOR: f64 = 0.1;
pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;

/// Detections overlapping above this IoU are clustered as one face.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.2;

/// Region Extractor cutoff on the cascade's aggregate score.
///
/// This is a tuned value carried over from the deployed detector
/// configuration. It happens to be within 3e-6 of π; it is not derived
/// from π and should be adjusted through `Settings::confidence_threshold`.
#[allow(clippy::approx_constant)]
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 3.14159;

/// Similarity cutoff per sensitivity level 0..=3.
pub const DEFAULT_LEVEL_THRESHOLDS: [f64; 4] = [0.8, 0.6, 0.8, 0.9];

/// Bits in a perceptual fingerprint.
pub const FINGERPRINT_BITS: u32 = 64;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
