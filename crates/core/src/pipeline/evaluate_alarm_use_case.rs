use std::path::PathBuf;
use std::sync::Arc;

use crate::alarm::domain::alarm_error::AlarmError;
use crate::alarm::domain::decision::{AlarmDecision, ComparisonOutcome, Degradation, MatchedCandidate};
use crate::alarm::domain::sensitivity::{LevelThresholds, SensitivityLevel};
use crate::alarm::domain::watch_task::WatchTask;
use crate::detection::domain::face_detector::{DetectorStatus, FaceDetector};
use crate::detection::domain::region_extractor::{FaceCrop, RegionExtractor};
use crate::fingerprint::domain::fingerprint::{similarity, Fingerprint};
use crate::fingerprint::domain::fingerprint_engine::FingerprintEngine;
use crate::media::domain::crop_writer::CropWriter;
use crate::pipeline::audit_logger::AuditLogger;
use crate::shared::frame::Frame;
use crate::shared::settings::Settings;

/// Decides whether any candidate image shows the watch-list subject.
///
/// Detector and fingerprint engine are shared handles, so one use case can
/// serve concurrent evaluations from several threads. Per-subject state lives
/// in the task's [`ReferenceCache`](crate::alarm::domain::reference_cache::ReferenceCache).
pub struct EvaluateAlarmUseCase {
    detector: Arc<dyn FaceDetector>,
    engine: Arc<dyn FingerprintEngine>,
    extractor: RegionExtractor,
    thresholds: LevelThresholds,
    crop_output: Option<(Box<dyn CropWriter>, PathBuf)>,
}

impl EvaluateAlarmUseCase {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        engine: Arc<dyn FingerprintEngine>,
        settings: &Settings,
    ) -> Result<Self, AlarmError> {
        Ok(Self {
            detector,
            engine,
            extractor: RegionExtractor::new(settings.confidence_threshold),
            thresholds: LevelThresholds::new(settings.level_thresholds)?,
            crop_output: None,
        })
    }

    /// Saves every extracted face crop under `dir` as a diagnostic aid.
    pub fn with_crop_writer(mut self, writer: Box<dyn CropWriter>, dir: PathBuf) -> Self {
        self.crop_output = Some((writer, dir));
        self
    }

    /// Evaluates one task.
    ///
    /// Input errors are reported before any detection work. Candidates are
    /// scanned in order and the scan stops at the first face whose
    /// similarity is strictly above the level's threshold.
    pub fn execute(
        &self,
        task: &WatchTask,
        logger: &mut dyn AuditLogger,
    ) -> Result<AlarmDecision, AlarmError> {
        let (level, threshold) = self.validate(task)?;

        let degraded = match self.detector.status() {
            DetectorStatus::Inert { reason } => Some(Degradation::DetectorInert { reason }),
            DetectorStatus::Ready { .. } => None,
        };

        let reference = task
            .reference
            .cache()
            .get_or_compute(|| self.reference_fingerprint(task.reference.image()));
        logger.reference(reference.as_ref());

        let Some(reference) = reference else {
            return Ok(AlarmDecision::no_alarm(
                threshold,
                0,
                degraded.or(Some(Degradation::NoReferenceFace)),
            ));
        };

        let mut compared = 0;
        for (index, (slot, id)) in task.candidates.iter().zip(&task.identifiers).enumerate() {
            let Some(image) = slot else {
                continue;
            };

            for crop in self.faces(image, &format!("candidate-{index}")) {
                let fingerprint = match self.engine.fingerprint(&crop.image) {
                    Ok(fp) => Some(fp),
                    Err(e) => {
                        log::warn!("Skipping region in candidate {id}: {e}");
                        None
                    }
                };
                let score = similarity(Some(&reference), fingerprint.as_ref());
                let matched = score > threshold;
                compared += 1;

                logger.comparison(&ComparisonOutcome {
                    index,
                    id: id.clone(),
                    region: crop.detection,
                    similarity: score,
                    threshold,
                    matched,
                });

                if matched {
                    logger.info(&format!("Alarm at {level}: candidate {id}"));
                    let candidate = MatchedCandidate {
                        index,
                        id: id.clone(),
                        similarity: score,
                    };
                    return Ok(AlarmDecision::matched(candidate, threshold, compared, degraded));
                }
            }
        }

        logger.info(&format!(
            "No alarm at {level}: {compared} regions in {} candidates compared",
            task.candidates.len()
        ));
        Ok(AlarmDecision::no_alarm(threshold, compared, degraded))
    }

    fn validate(&self, task: &WatchTask) -> Result<(SensitivityLevel, f64), AlarmError> {
        if task.candidates.len() != task.identifiers.len() {
            return Err(AlarmError::LengthMismatch {
                candidates: task.candidates.len(),
                identifiers: task.identifiers.len(),
            });
        }

        let resolved = self.thresholds.resolve(task.level)?;

        if let Some(index) = task.candidates.iter().position(Option::is_none) {
            return Err(AlarmError::MissingImage {
                index,
                id: task.identifiers[index].clone(),
            });
        }

        if task.reference.image().is_none() && task.reference.cached_fingerprint().is_none() {
            return Err(AlarmError::MissingReference);
        }

        if let Some(cached) = task.reference.cached_fingerprint() {
            let engine = self.engine.algorithm();
            if cached.algorithm() != engine {
                return Err(AlarmError::AlgorithmMismatch {
                    cached: cached.algorithm(),
                    engine,
                });
            }
        }

        Ok(resolved)
    }

    /// Fingerprint of the most confident face in the reference image.
    fn reference_fingerprint(&self, image: Option<&Frame>) -> Option<Fingerprint> {
        let image = image?;
        let best = self
            .faces(image, "reference")
            .into_iter()
            .reduce(|best, crop| {
                if crop.detection.score > best.detection.score {
                    crop
                } else {
                    best
                }
            })?;

        match self.engine.fingerprint(&best.image) {
            Ok(fp) => Some(fp),
            Err(e) => {
                log::warn!("Could not fingerprint reference face: {e}");
                None
            }
        }
    }

    fn faces(&self, image: &Frame, label: &str) -> Vec<FaceCrop> {
        let detections = self.detector.detect(image);
        let crops = self.extractor.extract(image, &detections);
        log::debug!(
            "{label}: {} detections, {} above confidence {}",
            detections.len(),
            crops.len(),
            self.extractor.confidence_threshold()
        );
        self.save_crops(&crops, label);
        crops
    }

    fn save_crops(&self, crops: &[FaceCrop], label: &str) {
        let Some((writer, dir)) = &self.crop_output else {
            return;
        };
        for (i, crop) in crops.iter().enumerate() {
            let path = dir.join(format!("{label}-{i}-{:.2}.jpg", crop.detection.score));
            if let Err(e) = writer.write(&path, &crop.image) {
                log::warn!("Failed to save crop {}: {e}", path.display());
            }
        }
    }
}
