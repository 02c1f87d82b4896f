use thiserror::Error;

use crate::fingerprint::domain::fingerprint::FingerprintAlgorithm;

/// Caller contract violations, raised before any detection work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlarmError {
    #[error("{candidates} candidate images but {identifiers} identifiers")]
    LengthMismatch {
        candidates: usize,
        identifiers: usize,
    },
    #[error("unknown sensitivity level {0} (expected 0-3)")]
    UnknownSensitivityLevel(i64),
    #[error("candidate {index} ({id}) has no image")]
    MissingImage { index: usize, id: String },
    #[error("watch-list entry has neither a reference image nor a cached fingerprint")]
    MissingReference,
    #[error("cached reference is a {cached} fingerprint but the engine computes {engine}")]
    AlgorithmMismatch {
        cached: FingerprintAlgorithm,
        engine: FingerprintAlgorithm,
    },
    #[error("threshold for level {level} must be in (0, 1), got {value}")]
    InvalidThreshold { level: u8, value: f64 },
}
