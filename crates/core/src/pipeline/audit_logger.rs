use crate::alarm::domain::decision::ComparisonOutcome;
use crate::fingerprint::domain::fingerprint::Fingerprint;

/// Observer for alarm evaluation events.
///
/// Keeps the evaluator free of output concerns: hosts decide whether
/// comparisons go to the log, an audit store, or nowhere.
pub trait AuditLogger: Send {
    /// Record one reference-versus-region comparison.
    fn comparison(&mut self, outcome: &ComparisonOutcome);

    /// Record the reference fingerprint in use, or `None` when the
    /// reference image had no usable face.
    fn reference(&mut self, fingerprint: Option<&Fingerprint>);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-evaluation summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullAuditLogger;

impl AuditLogger for NullAuditLogger {
    fn comparison(&mut self, _outcome: &ComparisonOutcome) {}
    fn reference(&mut self, _fingerprint: Option<&Fingerprint>) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger that writes every event through the `log` facade and keeps the
/// comparison outcomes for later inspection.
#[derive(Default)]
pub struct LogAuditLogger {
    outcomes: Vec<ComparisonOutcome>,
    reference: Option<Fingerprint>,
}

impl LogAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> &[ComparisonOutcome] {
        &self.outcomes
    }

    pub fn reference_fingerprint(&self) -> Option<Fingerprint> {
        self.reference
    }

    /// Returns the formatted summary, or `None` if nothing was compared.
    pub fn summary_string(&self) -> Option<String> {
        if self.outcomes.is_empty() {
            return None;
        }

        let matches = self.outcomes.iter().filter(|o| o.matched).count();
        let best = self
            .outcomes
            .iter()
            .max_by(|a, b| a.similarity.total_cmp(&b.similarity))?;

        let mut lines = vec![format!(
            "Alarm summary ({} comparisons, {matches} above threshold):",
            self.outcomes.len()
        )];
        lines.push(format!(
            "  best: [{}] similarity {:.4} (threshold {:.2})",
            best.id, best.similarity, best.threshold
        ));
        Some(lines.join("\n"))
    }
}

impl AuditLogger for LogAuditLogger {
    fn comparison(&mut self, outcome: &ComparisonOutcome) {
        log::info!("{outcome}");
        self.outcomes.push(outcome.clone());
    }

    fn reference(&mut self, fingerprint: Option<&Fingerprint>) {
        match fingerprint {
            Some(fp) => log::info!("Reference fingerprint {fp}"),
            None => log::warn!("No face found in reference image; no comparison can match"),
        }
        self.reference = fingerprint.copied();
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
