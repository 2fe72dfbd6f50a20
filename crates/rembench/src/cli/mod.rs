//! CLI command implementations.

pub mod analyze;
pub mod compare;
pub mod config;
pub mod score;
pub mod tests;

use rembench_core::types::{ScoreProvenance, ScoreSet};

/// Render a score set as `edge/detail/transparency → overall`, marking
/// defaulted sets with `*` so a substituted 7 is distinguishable from a
/// measured one.
pub fn format_scores(scores: &ScoreSet) -> String {
    let marker = match scores.provenance {
        ScoreProvenance::Measured => "",
        ScoreProvenance::Defaulted => " *",
    };
    format!(
        "edge {} / detail {} / transparency {} -> overall {}{marker}",
        scores.edge_accuracy, scores.detail_preservation, scores.transparency, scores.overall
    )
}
