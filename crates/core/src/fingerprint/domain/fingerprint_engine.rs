use crate::fingerprint::domain::fingerprint::{Fingerprint, FingerprintAlgorithm, FingerprintError};
use crate::shared::frame::Frame;

/// Domain interface for perceptual fingerprinting.
///
/// Implementations must be deterministic: the same image always yields the
/// same fingerprint, tagged with [`algorithm`](Self::algorithm).
pub trait FingerprintEngine: Send + Sync {
    fn algorithm(&self) -> FingerprintAlgorithm;

    fn fingerprint(&self, image: &Frame) -> Result<Fingerprint, FingerprintError>;
}
