use std::fmt;

use crate::alarm::domain::alarm_error::AlarmError;
use crate::shared::constants::DEFAULT_LEVEL_THRESHOLDS;

/// Caller-selected alarm sensitivity, 0 through 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensitivityLevel(u8);

impl SensitivityLevel {
    pub const MAX: u8 = 3;
}

impl TryFrom<i64> for SensitivityLevel {
    type Error = AlarmError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        if (0..=Self::MAX as i64).contains(&level) {
            Ok(Self(level as u8))
        } else {
            Err(AlarmError::UnknownSensitivityLevel(level))
        }
    }
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.0)
    }
}

/// Total map from sensitivity level to similarity cutoff in (0, 1).
///
/// An alarm fires when a candidate's similarity is strictly above the
/// cutoff for the requested level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds([f64; 4]);

impl LevelThresholds {
    pub fn new(thresholds: [f64; 4]) -> Result<Self, AlarmError> {
        for (level, &value) in thresholds.iter().enumerate() {
            if !(value > 0.0 && value < 1.0) {
                return Err(AlarmError::InvalidThreshold {
                    level: level as u8,
                    value,
                });
            }
        }
        Ok(Self(thresholds))
    }

    pub fn threshold(&self, level: SensitivityLevel) -> f64 {
        self.0[level.0 as usize]
    }

    /// Validates a raw host-supplied level and returns its cutoff.
    pub fn resolve(&self, level: i64) -> Result<(SensitivityLevel, f64), AlarmError> {
        let level = SensitivityLevel::try_from(level)?;
        Ok((level, self.threshold(level)))
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self(DEFAULT_LEVEL_THRESHOLDS)
    }
}
