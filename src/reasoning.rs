/// Everything the narrator needs to explain one decision.
#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    pub filename: &'a str,
    pub file_score: f64,
    pub pair_score: f64,
    pub threshold: f64,
    pub accepted: bool,
}

/// Produces the textual explanation attached to every answer.
///
/// Implementations must be pure functions of the outcome: the trace is stored
/// by analytics and compared across runs, so identical inputs must yield
/// identical text. A model-backed narrator would slot in behind this same
/// trait; the core only ships the deterministic template.
pub trait ReasoningStrategy: Send + Sync {
    fn explain(&self, outcome: &MatchOutcome<'_>) -> String;
}

/// The default rule-based narrator: names the selected file, the numeric
/// scores, and the threshold comparison that drove the decision.
#[derive(Debug, Default)]
pub struct TemplateReasoner;

impl ReasoningStrategy for TemplateReasoner {
    fn explain(&self, outcome: &MatchOutcome<'_>) -> String {
        if outcome.accepted {
            format!(
                "best match {} (file score {:.2}); score {:.2} >= threshold {:.2} -> selected entry from {}",
                outcome.filename,
                outcome.file_score,
                outcome.pair_score,
                outcome.threshold,
                outcome.filename,
            )
        } else {
            format!(
                "best match {} (file score {:.2}); best score {:.2} < threshold {:.2} -> no sufficiently relevant FAQ",
                outcome.filename,
                outcome.file_score,
                outcome.pair_score,
                outcome.threshold,
            )
        }
    }
}
