use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fingerprint::domain::fingerprint::FingerprintAlgorithm;
use crate::shared::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_LEVEL_THRESHOLDS,
    DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE, DEFAULT_SCALE_FACTOR, DEFAULT_SHIFT_FACTOR,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Every tunable of the detection and alarm pipeline.
///
/// `Settings::default()` reproduces the deployed configuration. Files may
/// specify any subset of fields; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub min_size: u32,
    pub max_size: u32,
    pub shift_factor: f64,
    pub scale_factor: f64,
    /// Cascade rotation in turns. Only upright (0.0) scanning is supported.
    pub angle: f64,
    pub iou_threshold: f64,
    pub confidence_threshold: f64,
    pub level_thresholds: [f64; 4],
    pub algorithm: FingerprintAlgorithm,
    pub cascade_paths: Vec<PathBuf>,
    pub save_crops: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            shift_factor: DEFAULT_SHIFT_FACTOR,
            scale_factor: DEFAULT_SCALE_FACTOR,
            angle: 0.0,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            level_thresholds: DEFAULT_LEVEL_THRESHOLDS,
            algorithm: FingerprintAlgorithm::Average,
            cascade_paths: Vec::new(),
            save_crops: None,
        }
    }
}

impl Settings {
    /// Reads a JSON settings file and validates it.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.min_size == 0 {
            return Err(invalid("min_size", "must be positive".into()));
        }
        if self.min_size > self.max_size {
            return Err(invalid(
                "max_size",
                format!("{} is below min_size {}", self.max_size, self.min_size),
            ));
        }
        if !(self.shift_factor > 0.0 && self.shift_factor <= 1.0) {
            return Err(invalid(
                "shift_factor",
                format!("must be in (0, 1], got {}", self.shift_factor),
            ));
        }
        if !(self.scale_factor > 1.0) {
            return Err(invalid(
                "scale_factor",
                format!("must be greater than 1, got {}", self.scale_factor),
            ));
        }
        if self.angle != 0.0 {
            return Err(invalid(
                "angle",
                format!("only upright scanning (0.0) is supported, got {}", self.angle),
            ));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(invalid(
                "iou_threshold",
                format!("must be in [0, 1], got {}", self.iou_threshold),
            ));
        }
        if !self.confidence_threshold.is_finite() {
            return Err(invalid("confidence_threshold", "must be finite".into()));
        }
        for (level, t) in self.level_thresholds.iter().enumerate() {
            if !(*t > 0.0 && *t < 1.0) {
                return Err(invalid(
                    "level_thresholds",
                    format!("level {level} threshold must be in (0, 1), got {t}"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults_match_deployed_configuration() {
        let s = Settings::default();
        assert_eq!(s.min_size, 32);
        assert_eq!(s.max_size, 1000);
        assert_relative_eq!(s.shift_factor, 0.1);
        assert_relative_eq!(s.scale_factor, 1.1);
        assert_relative_eq!(s.iou_threshold, 0.2);
        assert_eq!(s.level_thresholds, [0.8, 0.6, 0.8, 0.9]);
        assert_eq!(s.algorithm, FingerprintAlgorithm::Average);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_confidence_threshold_is_a_named_setting_not_pi() {
        // The deployed cutoff sits suspiciously close to π. It is a tuned
        // value and must stay configurable rather than tied to the constant.
        let s = Settings::default();
        assert_relative_eq!(s.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert!((s.confidence_threshold - std::f64::consts::PI).abs() < 1e-5);
        assert_ne!(s.confidence_threshold, std::f64::consts::PI);

        let tuned: Settings = serde_json::from_str(r#"{"confidence_threshold": 1.5}"#).unwrap();
        assert_relative_eq!(tuned.confidence_threshold, 1.5);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"min_size": 48, "algorithm": "difference"}"#).unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.min_size, 48);
        assert_eq!(s.max_size, 1000);
        assert_eq!(s.algorithm, FingerprintAlgorithm::Difference);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_json_roundtrip_preserves_fields() {
        let s = Settings {
            save_crops: Some(PathBuf::from("/tmp/crops")),
            cascade_paths: vec![PathBuf::from("models/facefinder")],
            ..Settings::default()
        };
        let back: Settings = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[rstest]
    #[case::zero_min_size(Settings { min_size: 0, ..Settings::default() }, "min_size")]
    #[case::inverted_sizes(Settings { min_size: 64, max_size: 32, ..Settings::default() }, "max_size")]
    #[case::zero_shift(Settings { shift_factor: 0.0, ..Settings::default() }, "shift_factor")]
    #[case::non_growing_scale(Settings { scale_factor: 1.0, ..Settings::default() }, "scale_factor")]
    #[case::rotated(Settings { angle: 0.25, ..Settings::default() }, "angle")]
    #[case::iou_above_one(Settings { iou_threshold: 1.5, ..Settings::default() }, "iou_threshold")]
    #[case::nan_confidence(Settings { confidence_threshold: f64::NAN, ..Settings::default() }, "confidence_threshold")]
    #[case::level_threshold_one(Settings { level_thresholds: [0.8, 0.6, 1.0, 0.9], ..Settings::default() }, "level_thresholds")]
    #[case::level_threshold_zero(Settings { level_thresholds: [0.0, 0.6, 0.8, 0.9], ..Settings::default() }, "level_thresholds")]
    fn test_validate_rejects(#[case] settings: Settings, #[case] expected_field: &str) {
        match settings.validate() {
            Err(SettingsError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid {expected_field}, got {other:?}"),
        }
    }
}
