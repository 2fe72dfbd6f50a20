//! Pure score extraction from free-text vision-model output.
//!
//! Grammar per metric: label, optional whitespace/colon, integer
//! (`Edge: 8`, `edge 8`, `Edge:8` all match, case-insensitive, with
//! arbitrary surrounding text). Parse failures never raise: the
//! fallback policy substitutes a neutral 7 per missing metric in
//! single mode and a descending `8 - index` placeholder in comparative
//! mode, and the result is flagged `Defaulted` so callers can tell a
//! measured score from a substituted one.

use crate::types::{ScoreProvenance, ScoreSet};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Neutral stand-in for a metric the model's response didn't contain.
const DEFAULT_METRIC: i64 = 7;

fn metric_regex(cell: &'static OnceLock<Regex>, label: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(&format!(r"(?i){label}[:\s]+(\d+)")).expect("metric pattern is valid")
    })
}

fn edge_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    metric_regex(&RE, "Edge")
}

fn detail_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    metric_regex(&RE, "Detail")
}

fn transparency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    metric_regex(&RE, "Transparency")
}

fn first_int(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse a single-result scoring response.
///
/// Each metric is taken from the first labeled match anywhere in the
/// text; a missing or unparseable metric defaults to 7 and marks the
/// whole set `Defaulted`.
pub fn parse_single(text: &str) -> ScoreSet {
    let edge = first_int(edge_regex(), text);
    let detail = first_int(detail_regex(), text);
    let transparency = first_int(transparency_regex(), text);

    let provenance = if edge.is_some() && detail.is_some() && transparency.is_some() {
        ScoreProvenance::Measured
    } else {
        ScoreProvenance::Defaulted
    };

    ScoreSet::new(
        edge.unwrap_or(DEFAULT_METRIC),
        detail.unwrap_or(DEFAULT_METRIC),
        transparency.unwrap_or(DEFAULT_METRIC),
        provenance,
    )
}

/// Parse a comparative-scoring response for `count` candidates.
///
/// Each candidate's block is anchored on its ordinal (`Result K`, word
/// boundary so `Result 1` never matches inside `Result 12`) with a
/// bounded window to the three labeled numbers, tolerating arbitrary
/// interleaved text. A candidate with no matching block receives the
/// `8 - index` placeholder so a partial parse still yields a complete,
/// monotonically-ordered mapping.
pub fn parse_comparative(text: &str, count: usize) -> Vec<ScoreSet> {
    (0..count)
        .map(|index| {
            parse_candidate_block(text, index + 1).unwrap_or_else(|| ScoreSet::fallback(index))
        })
        .collect()
}

/// Per-ordinal block pattern, compiled once and reused across calls.
fn candidate_regex(ordinal: usize) -> Regex {
    static CACHE: OnceLock<Mutex<HashMap<usize, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().unwrap();
    cache
        .entry(ordinal)
        .or_insert_with(|| {
            // Window sizes bound how far the three labels may drift from
            // the ordinal before the block is considered absent.
            let pattern = format!(
                r"(?is)Result\s*{ordinal}\b.{{0,50}}?Edge[:\s]+(\d+).{{0,30}}?Detail[:\s]+(\d+).{{0,30}}?Transparency[:\s]+(\d+)"
            );
            Regex::new(&pattern).expect("candidate pattern is valid")
        })
        .clone()
}

fn parse_candidate_block(text: &str, ordinal: usize) -> Option<ScoreSet> {
    let caps = candidate_regex(ordinal).captures(text)?;

    let metric = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<i64>().ok());
    Some(ScoreSet::new(
        metric(1)?,
        metric(2)?,
        metric(3)?,
        ScoreProvenance::Measured,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_labeled_lines() {
        let scores = parse_single("Edge: 8\nDetail: 6\nTransparency: 9");
        assert_eq!(scores.edge_accuracy, 8);
        assert_eq!(scores.detail_preservation, 6);
        assert_eq!(scores.transparency, 9);
        assert_eq!(scores.overall, 8); // round(23/3)
        assert_eq!(scores.provenance, ScoreProvenance::Measured);
    }

    #[test]
    fn test_parse_single_tolerates_surrounding_text() {
        let text = "After careful inspection, I rate this:\n\
                    Edge Accuracy gets Edge: 7 due to minor halos.\n\
                    detail: 5 (soft hair strands)\n\
                    The Transparency   9 is excellent overall.";
        let scores = parse_single(text);
        assert_eq!(scores.edge_accuracy, 7);
        assert_eq!(scores.detail_preservation, 5);
        assert_eq!(scores.transparency, 9);
        assert_eq!(scores.provenance, ScoreProvenance::Measured);
    }

    #[test]
    fn test_parse_single_missing_metric_defaults_to_seven() {
        let scores = parse_single("Edge: 9\nTransparency: 8");
        assert_eq!(scores.edge_accuracy, 9);
        assert_eq!(scores.detail_preservation, 7);
        assert_eq!(scores.transparency, 8);
        assert_eq!(scores.provenance, ScoreProvenance::Defaulted);
    }

    #[test]
    fn test_parse_single_garbage_yields_all_defaults() {
        let scores = parse_single("I cannot evaluate this image.");
        assert_eq!(scores.edge_accuracy, 7);
        assert_eq!(scores.detail_preservation, 7);
        assert_eq!(scores.transparency, 7);
        assert_eq!(scores.overall, 7);
        assert_eq!(scores.provenance, ScoreProvenance::Defaulted);
    }

    #[test]
    fn test_parse_single_clamps_out_of_range() {
        let scores = parse_single("Edge: 15\nDetail: 0\nTransparency: 8");
        assert_eq!(scores.edge_accuracy, 10);
        assert_eq!(scores.detail_preservation, 1);
        assert_eq!(scores.transparency, 8);
    }

    #[test]
    fn test_parse_single_is_idempotent() {
        let text = "Edge: 8, Detail: 6, Transparency: 9. Solid result.";
        assert_eq!(parse_single(text), parse_single(text));
    }

    #[test]
    fn test_parse_comparative_well_formed_blocks() {
        let text = "Result 1 - Edge: 9, Detail: 8, Transparency: 9\n\
                    Result 2 - Edge: 6, Detail: 7, Transparency: 5\n\
                    Result 3 - Edge: 4, Detail: 3, Transparency: 4";
        let scores = parse_comparative(text, 3);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].edge_accuracy, 9);
        assert_eq!(scores[1].detail_preservation, 7);
        assert_eq!(scores[2].transparency, 4);
        assert!(scores.iter().all(|s| s.provenance == ScoreProvenance::Measured));
    }

    #[test]
    fn test_parse_comparative_blocks_in_any_order() {
        let text = "Ranking from worst to best:\n\
                    Result 2: Edge: 5 Detail: 4 Transparency: 6\n\
                    Result 1 is the winner: Edge: 10, Detail: 9, Transparency: 10";
        let scores = parse_comparative(text, 2);
        assert_eq!(scores[0].edge_accuracy, 10);
        assert_eq!(scores[1].edge_accuracy, 5);
    }

    #[test]
    fn test_parse_comparative_interleaved_commentary() {
        let text = "Result 1 (clean edges) - Edge: 8, then Detail: 7 and Transparency: 8.";
        let scores = parse_comparative(text, 1);
        assert_eq!(scores[0].edge_accuracy, 8);
        assert_eq!(scores[0].detail_preservation, 7);
        assert_eq!(scores[0].transparency, 8);
    }

    #[test]
    fn test_parse_comparative_missing_block_gets_descending_fallback() {
        let text = "Result 1 - Edge: 9, Detail: 9, Transparency: 9";
        let scores = parse_comparative(text, 3);
        assert_eq!(scores[0].edge_accuracy, 9);
        // Index 1 and 2 fall back to 8 - index
        assert_eq!(
            scores[1],
            ScoreSet::new(7, 7, 7, ScoreProvenance::Defaulted)
        );
        assert_eq!(
            scores[2],
            ScoreSet::new(6, 6, 6, ScoreProvenance::Defaulted)
        );
    }

    #[test]
    fn test_parse_comparative_all_garbage_stays_monotonic() {
        let scores = parse_comparative("no scores here at all", 4);
        let overalls: Vec<u8> = scores.iter().map(|s| s.overall).collect();
        assert_eq!(overalls, vec![8, 7, 6, 5]);
        assert!(scores.iter().all(|s| s.provenance == ScoreProvenance::Defaulted));
    }

    #[test]
    fn test_parse_comparative_ordinal_does_not_match_prefix() {
        // "Result 12" must not satisfy the anchor for Result 1
        let text = "Result 12 - Edge: 3, Detail: 3, Transparency: 3";
        let scores = parse_comparative(text, 1);
        assert_eq!(scores[0], ScoreSet::fallback(0));
    }

    #[test]
    fn test_parse_comparative_window_bounds_block_distance() {
        // The three labels sit too far past the ordinal to belong to it
        let filler = "x".repeat(200);
        let text = format!("Result 1 {filler} Edge: 9 Detail: 9 Transparency: 9");
        let scores = parse_comparative(&text, 1);
        assert_eq!(scores[0], ScoreSet::fallback(0));
    }

    #[test]
    fn test_parse_comparative_repeated_calls_agree() {
        // Second call hits the cached per-ordinal patterns
        let text = "Result 1 - Edge: 9, Detail: 8, Transparency: 9\n\
                    Result 2 - Edge: 5, Detail: 6, Transparency: 5";
        let first = parse_comparative(text, 3);
        let second = parse_comparative(text, 3);
        assert_eq!(first, second);
        assert_eq!(second[2], ScoreSet::fallback(2));
    }

    #[test]
    fn test_parse_comparative_case_insensitive() {
        let text = "RESULT 1 - edge: 7, DETAIL: 6, transparency: 8";
        let scores = parse_comparative(text, 1);
        assert_eq!(scores[0].edge_accuracy, 7);
        assert_eq!(scores[0].provenance, ScoreProvenance::Measured);
    }
}
