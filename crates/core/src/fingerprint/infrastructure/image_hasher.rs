//! Average/difference hashing on top of the `image` crate's resampling.

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::fingerprint::domain::fingerprint::{Fingerprint, FingerprintAlgorithm, FingerprintError};
use crate::fingerprint::domain::fingerprint_engine::FingerprintEngine;
use crate::shared::frame::Frame;

/// Side of the hash grid; `GRID * GRID` = 64 bits.
const GRID: u32 = 8;

pub struct ImageHasher {
    algorithm: FingerprintAlgorithm,
}

impl ImageHasher {
    pub fn new(algorithm: FingerprintAlgorithm) -> Self {
        Self { algorithm }
    }
}

impl Default for ImageHasher {
    fn default() -> Self {
        Self::new(FingerprintAlgorithm::Average)
    }
}

impl FingerprintEngine for ImageHasher {
    fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    fn fingerprint(&self, image: &Frame) -> Result<Fingerprint, FingerprintError> {
        if image.is_empty() {
            return Err(FingerprintError::EmptyImage);
        }
        let rgb = image.to_rgb_image().ok_or(FingerprintError::EmptyImage)?;
        let gray = imageops::grayscale(&rgb);

        let bits = match self.algorithm {
            FingerprintAlgorithm::Average => average_bits(&gray),
            FingerprintAlgorithm::Difference => difference_bits(&gray),
        };
        Ok(Fingerprint::new(self.algorithm, bits))
    }
}

/// Bit `i` (MSB first, row-major) is set when cell `i` is above the mean.
fn average_bits(gray: &GrayImage) -> u64 {
    let small = imageops::resize(gray, GRID, GRID, FilterType::Triangle);
    let cells = small.as_raw();
    let mean = cells.iter().map(|&v| v as f64).sum::<f64>() / cells.len() as f64;

    cells
        .iter()
        .fold(0u64, |acc, &v| (acc << 1) | u64::from(v as f64 > mean))
}

/// Bit set when a cell is brighter than its right neighbour.
fn difference_bits(gray: &GrayImage) -> u64 {
    let small = imageops::resize(gray, GRID + 1, GRID, FilterType::Triangle);
    let mut bits = 0u64;
    for y in 0..GRID {
        for x in 0..GRID {
            let left = small.get_pixel(x, y).0[0];
            let right = small.get_pixel(x + 1, y).0[0];
            bits = (bits << 1) | u64::from(left > right);
        }
    }
    bits
}
