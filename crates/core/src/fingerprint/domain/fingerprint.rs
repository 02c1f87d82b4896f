use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::FINGERPRINT_BITS;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("cannot compare a {left} fingerprint with a {right} fingerprint")]
    AlgorithmMismatch {
        left: FingerprintAlgorithm,
        right: FingerprintAlgorithm,
    },
    #[error("cannot fingerprint an empty image")]
    EmptyImage,
    #[error("malformed fingerprint `{0}`")]
    Parse(String),
}

/// Hashing scheme a fingerprint was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// Bits mark 8×8 cells brighter than the mean.
    Average,
    /// Bits mark cells brighter than their right neighbour (9×8 grid).
    Difference,
}

impl FingerprintAlgorithm {
    fn tag(self) -> char {
        match self {
            FingerprintAlgorithm::Average => 'a',
            FingerprintAlgorithm::Difference => 'd',
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "a" => Some(FingerprintAlgorithm::Average),
            "d" => Some(FingerprintAlgorithm::Difference),
            _ => None,
        }
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintAlgorithm::Average => write!(f, "average-hash"),
            FingerprintAlgorithm::Difference => write!(f, "difference-hash"),
        }
    }
}

/// A 64-bit perceptual signature of one image region.
///
/// Formats as `<tag>:<16 hex digits>` (`a:` average, `d:` difference) and
/// parses back from the same form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    algorithm: FingerprintAlgorithm,
    bits: u64,
}

impl Fingerprint {
    pub fn new(algorithm: FingerprintAlgorithm, bits: u64) -> Self {
        Self { algorithm, bits }
    }

    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Hamming distance in `0..=64`. Fingerprints from different
    /// algorithms are not comparable.
    pub fn distance(&self, other: &Fingerprint) -> Result<u32, FingerprintError> {
        if self.algorithm != other.algorithm {
            return Err(FingerprintError::AlgorithmMismatch {
                left: self.algorithm,
                right: other.algorithm,
            });
        }
        Ok((self.bits ^ other.bits).count_ones())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.algorithm.tag(), self.bits)
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FingerprintError::Parse(s.to_string());
        let (tag, hex) = s.split_once(':').ok_or_else(malformed)?;
        let algorithm = FingerprintAlgorithm::from_tag(tag).ok_or_else(malformed)?;
        if hex.len() != 16 {
            return Err(malformed());
        }
        let bits = u64::from_str_radix(hex, 16).map_err(|_| malformed())?;
        Ok(Self { algorithm, bits })
    }
}

/// Similarity in [0, 1]: `1 - distance / 64`.
///
/// An absent fingerprint on either side scores 0.0, as does an algorithm
/// mismatch, so missing data never raises an alarm.
pub fn similarity(a: Option<&Fingerprint>, b: Option<&Fingerprint>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    match a.distance(b) {
        Ok(d) => 1.0 - d as f64 / FINGERPRINT_BITS as f64,
        Err(e) => {
            log::warn!("Treating incomparable fingerprints as dissimilar: {e}");
            0.0
        }
    }
}
