use crate::shared::constants::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// A square face crop together with the detection it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCrop {
    pub detection: Detection,
    pub image: Frame,
}

/// Turns confident detections into square image crops.
///
/// A detection survives when its score is strictly above the confidence
/// threshold. Crops are centred on `(col, row)` with half-width `scale / 2`
/// and clipped to the image; windows entirely outside the image are dropped.
/// Output order follows detection order.
#[derive(Clone, Debug)]
pub struct RegionExtractor {
    confidence_threshold: f64,
}

impl RegionExtractor {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn extract(&self, image: &Frame, detections: &[Detection]) -> Vec<FaceCrop> {
        detections
            .iter()
            .filter(|d| d.score > self.confidence_threshold)
            .filter_map(|d| {
                let (x, y, side) = d.bounds();
                let crop = image.crop(x, y, side, side);
                if crop.is_empty() {
                    return None;
                }
                Some(FaceCrop {
                    detection: *d,
                    image: crop,
                })
            })
            .collect()
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}
