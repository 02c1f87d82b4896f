use std::fmt;

use crate::shared::detection::Detection;

/// The candidate that raised the alarm.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedCandidate {
    pub index: usize,
    pub id: String,
    pub similarity: f64,
}

/// Why an evaluation could not have raised an alarm, when the cause is
/// something other than "no candidate looked alike".
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    /// The detector never loaded its cascade.
    DetectorInert { reason: String },
    /// The reference image had no face above the confidence threshold.
    NoReferenceFace,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::DetectorInert { reason } => write!(f, "detector inert: {reason}"),
            Degradation::NoReferenceFace => write!(f, "no face in reference image"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmDecision {
    pub alarm: bool,
    pub matched: Option<MatchedCandidate>,
    pub threshold: f64,
    /// Number of face regions compared against the reference.
    pub compared: usize,
    pub degraded: Option<Degradation>,
}

impl AlarmDecision {
    pub fn is_alarm(&self) -> bool {
        self.alarm
    }

    pub(crate) fn no_alarm(threshold: f64, compared: usize, degraded: Option<Degradation>) -> Self {
        Self {
            alarm: false,
            matched: None,
            threshold,
            compared,
            degraded,
        }
    }

    pub(crate) fn matched(
        candidate: MatchedCandidate,
        threshold: f64,
        compared: usize,
        degraded: Option<Degradation>,
    ) -> Self {
        Self {
            alarm: true,
            matched: Some(candidate),
            threshold,
            compared,
            degraded,
        }
    }
}

/// One reference-versus-region comparison, reported to the audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub index: usize,
    pub id: String,
    pub region: Detection,
    pub similarity: f64,
    pub threshold: f64,
    pub matched: bool,
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, verdict) = if self.matched {
            (">", "alarm")
        } else {
            ("<=", "no alarm")
        };
        write!(
            f,
            "[{}] similarity {:.4} {op} threshold {:.2}: {verdict}",
            self.id, self.similarity, self.threshold
        )
    }
}
