use std::sync::{Arc, OnceLock};

use crate::detection::domain::face_detector::{DetectorStatus, FaceDetector};
use crate::detection::infrastructure::cascade::{Cascade, CascadeError, CascadeParams};
use crate::detection::infrastructure::clustering::cluster_detections;
use crate::detection::infrastructure::model_resolver;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;
use crate::shared::settings::Settings;

static SHARED: OnceLock<Arc<CascadeFaceDetector>> = OnceLock::new();

/// Face detector backed by a pico-format pixel-comparison cascade.
///
/// Converts each frame to grayscale, scans it at every window size, and
/// clusters overlapping windows. A detector whose cascade failed to load is
/// inert: it reports [`DetectorStatus::Inert`] and finds nothing.
pub struct CascadeFaceDetector {
    cascade: Option<Arc<Cascade>>,
    params: CascadeParams,
    iou_threshold: f64,
    status: DetectorStatus,
}

impl CascadeFaceDetector {
    pub fn new(cascade: Cascade, settings: &Settings) -> Self {
        let status = DetectorStatus::Ready {
            trees: cascade.trees(),
            depth: cascade.depth(),
        };
        Self {
            cascade: Some(Arc::new(cascade)),
            params: CascadeParams::from(settings),
            iou_threshold: settings.iou_threshold,
            status,
        }
    }

    pub fn inert(reason: impl Into<String>, settings: &Settings) -> Self {
        Self {
            cascade: None,
            params: CascadeParams::from(settings),
            iou_threshold: settings.iou_threshold,
            status: DetectorStatus::Inert {
                reason: reason.into(),
            },
        }
    }

    /// Loads the cascade from the configured and default locations.
    pub fn try_load(settings: &Settings) -> Result<Self, CascadeError> {
        let candidates = model_resolver::candidate_paths(&settings.cascade_paths);
        let (_, cascade) = model_resolver::load_first(&candidates)?;
        Ok(Self::new(cascade, settings))
    }

    /// Like [`try_load`](Self::try_load), but degrades to an inert detector
    /// on failure. The failure is logged here, once, rather than per call.
    pub fn load(settings: &Settings) -> Self {
        match Self::try_load(settings) {
            Ok(detector) => detector,
            Err(e) => {
                log::warn!("Face detection disabled: {e}");
                Self::inert(e.to_string(), settings)
            }
        }
    }

    /// Process-wide detector, loaded on first call.
    ///
    /// Concurrent first callers block until the single load completes.
    /// `settings` only matters on the call that performs the load.
    pub fn shared(settings: &Settings) -> Arc<CascadeFaceDetector> {
        SHARED
            .get_or_init(|| Arc::new(Self::load(settings)))
            .clone()
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&self, frame: &Frame) -> Vec<Detection> {
        let Some(cascade) = &self.cascade else {
            return Vec::new();
        };
        if frame.is_empty() {
            return Vec::new();
        }
        let plane = frame.to_gray_plane();
        let raw = cascade.run(&plane, &self.params);
        let clustered = cluster_detections(&raw, self.iou_threshold);
        log::debug!(
            "Cascade scan of {}x{}: {} raw windows, {} clusters",
            frame.width(),
            frame.height(),
            raw.len(),
            clustered.len()
        );
        clustered
    }

    fn status(&self) -> DetectorStatus {
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::cascade::test_support::bright_centre_cascade;
    use std::fs;

    fn bright_square_frame(w: u32, h: u32, cx: u32, cy: u32, side: u32) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let inside = x + side / 2 >= cx
                    && x < cx + side / 2
                    && y + side / 2 >= cy
                    && y < cy + side / 2;
                let v = if inside { 230 } else { 10 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, w, h).unwrap()
    }

    fn small_window_settings() -> Settings {
        Settings {
            min_size: 40,
            max_size: 100,
            ..Settings::default()
        }
    }

    fn detector() -> CascadeFaceDetector {
        let settings = small_window_settings();
        let cascade = Cascade::unpack(&bright_centre_cascade()).unwrap();
        CascadeFaceDetector::new(cascade, &settings)
    }

    #[test]
    fn test_ready_status_reports_cascade_shape() {
        assert_eq!(
            detector().status(),
            DetectorStatus::Ready { trees: 1, depth: 1 }
        );
    }

    #[test]
    fn test_detects_single_clustered_face() {
        let frame = bright_square_frame(160, 160, 80, 80, 30);
        let dets = detector().detect(&frame);
        assert_eq!(dets.len(), 1);
        assert!((dets[0].row - 80).abs() <= 15);
        assert!((dets[0].col - 80).abs() <= 15);
        assert!(dets[0].score > 1.0, "clustered score aggregates windows");
    }

    #[test]
    fn test_two_separate_faces() {
        let mut frame = bright_square_frame(320, 160, 80, 80, 30);
        let right = bright_square_frame(320, 160, 240, 80, 30);
        // Union of the two bright squares.
        let data: Vec<u8> = frame
            .data()
            .iter()
            .zip(right.data())
            .map(|(a, b)| (*a).max(*b))
            .collect();
        frame = Frame::new(data, 320, 160).unwrap();

        let dets = detector().detect(&frame);
        assert_eq!(dets.len(), 2);
        let mut cols: Vec<i32> = dets.iter().map(|d| d.col).collect();
        cols.sort();
        assert!((cols[0] - 80).abs() <= 15);
        assert!((cols[1] - 240).abs() <= 15);
    }

    #[test]
    fn test_uniform_frame_has_no_detections() {
        let frame = Frame::filled(160, 160, [128, 128, 128]);
        assert!(detector().detect(&frame).is_empty());
    }

    #[test]
    fn test_empty_frame_has_no_detections() {
        let frame = Frame::new(Vec::new(), 0, 0).unwrap();
        assert!(detector().detect(&frame).is_empty());
    }

    #[test]
    fn test_inert_detector_finds_nothing_and_says_why() {
        let det = CascadeFaceDetector::inert("no cascade", &Settings::default());
        let frame = bright_square_frame(160, 160, 80, 80, 30);
        assert!(det.detect(&frame).is_empty());
        assert_eq!(
            det.status(),
            DetectorStatus::Inert {
                reason: "no cascade".into()
            }
        );
        assert!(!det.status().is_ready());
    }

    #[test]
    fn test_try_load_from_configured_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("facefinder");
        fs::write(&path, bright_centre_cascade()).unwrap();
        let settings = Settings {
            cascade_paths: vec![path],
            ..small_window_settings()
        };
        let det = CascadeFaceDetector::try_load(&settings).unwrap();
        assert!(det.status().is_ready());
    }

    #[test]
    fn test_load_corrupt_cascade_degrades_to_inert() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("facefinder");
        fs::write(&path, b"garbage").unwrap();
        let settings = Settings {
            cascade_paths: vec![path],
            ..Settings::default()
        };
        // The default locations may exist on a developer machine; only the
        // error path is deterministic here.
        let det = CascadeFaceDetector::load(&settings);
        if let DetectorStatus::Inert { reason } = det.status() {
            assert!(!reason.is_empty());
        }
    }

    #[test]
    fn test_shared_returns_same_instance() {
        let settings = Settings::default();
        let a = CascadeFaceDetector::shared(&settings);
        let b = CascadeFaceDetector::shared(&settings);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_shared_initializes_once_under_contention() {
        let settings = Settings::default();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = settings.clone();
                std::thread::spawn(move || CascadeFaceDetector::shared(&s))
            })
            .collect();
        let detectors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for d in &detectors[1..] {
            assert!(Arc::ptr_eq(&detectors[0], d));
        }
    }
}
