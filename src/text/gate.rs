//! Quality gate
//!
//! Decides what happens with the recognized lines: save the single good
//! candidate directly, ask the user to pick one, or reject the capture.

use super::classify::{has_artifacts, ideograph_density, ClassifiedLine};
use super::ranking::RankedCandidate;

/// Minimum length, in characters, of an auto-accepted line
const MIN_ACCEPT_LENGTH: usize = 2;

/// Ideograph density a single candidate must exceed to be auto-accepted
const MIN_IDEOGRAPH_DENSITY: f32 = 0.5;

/// Why a capture was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing readable in the image
    NoTextDetected,
    /// One Chinese line was found but it failed the quality checks.
    /// The text is kept so the user can still accept it explicitly.
    PoorQuality { text: String },
}

/// Outcome of the quality gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Exactly one strong candidate
    AutoAccept(String),
    /// Several viable candidates, best first
    PromptSelection(Vec<String>),
    /// No usable text
    Reject(RejectReason),
}

/// Apply the decision table
///
/// `ranked` holds the Chinese lines only; `all_lines` is the full classifier
/// output, used for the non-Chinese fallback. A lone Chinese line is only
/// auto-accepted when it is the only text found.
pub fn decide(all_lines: &[ClassifiedLine], ranked: &[RankedCandidate]) -> GateDecision {
    let others: Vec<String> = all_lines
        .iter()
        .filter(|line| !line.is_chinese)
        .map(|line| line.text.clone())
        .collect();

    match ranked {
        [] if others.is_empty() => GateDecision::Reject(RejectReason::NoTextDetected),
        [] => GateDecision::PromptSelection(others),
        // Other text on the sign may be the name; let the user choose
        [only] if !others.is_empty() => {
            let mut candidates = Vec::with_capacity(others.len() + 1);
            candidates.push(only.text.clone());
            candidates.extend(others);
            GateDecision::PromptSelection(candidates)
        }
        [only] => {
            if passes_quality(&only.text) {
                GateDecision::AutoAccept(only.text.clone())
            } else {
                GateDecision::Reject(RejectReason::PoorQuality {
                    text: only.text.clone(),
                })
            }
        }
        // Never auto-accept when there is a choice to make, whatever the score gap
        _ => GateDecision::PromptSelection(ranked.iter().map(|c| c.text.clone()).collect()),
    }
}

/// Quality check for a lone Chinese candidate
pub fn passes_quality(text: &str) -> bool {
    text.chars().count() >= MIN_ACCEPT_LENGTH
        && ideograph_density(text) > MIN_IDEOGRAPH_DENSITY
        && !has_artifacts(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::classify::classify;
    use crate::text::ranking::rank;

    fn run(raw: &str) -> GateDecision {
        let lines = classify(raw);
        let chinese: Vec<String> = lines
            .iter()
            .filter(|l| l.is_chinese)
            .map(|l| l.text.clone())
            .collect();
        decide(&lines, &rank(&chinese))
    }

    #[test]
    fn test_no_text_rejected() {
        assert_eq!(run(""), GateDecision::Reject(RejectReason::NoTextDetected));
        assert_eq!(decide(&[], &[]), GateDecision::Reject(RejectReason::NoTextDetected));
    }

    #[test]
    fn test_only_non_chinese_prompts_with_all_lines() {
        assert_eq!(
            run("OPEN 24H\nTEL 5551234"),
            GateDecision::PromptSelection(vec!["OPEN 24H".to_string(), "TEL 5551234".to_string()])
        );
    }

    #[test]
    fn test_two_chinese_lines_always_prompt() {
        assert_eq!(
            run("欢迎光临\n营业时间\n123"),
            GateDecision::PromptSelection(vec!["欢迎光临".to_string(), "营业时间".to_string()])
        );
        // score gap does not matter
        assert_eq!(
            run("电话\n老王火锅店"),
            GateDecision::PromptSelection(vec!["老王火锅店".to_string(), "电话".to_string()])
        );
    }

    #[test]
    fn test_single_strong_line_auto_accepted() {
        assert_eq!(run("老王火锅店"), GateDecision::AutoAccept("老王火锅店".to_string()));
    }

    #[test]
    fn test_single_character_is_poor_quality() {
        assert_eq!(
            run("店"),
            GateDecision::Reject(RejectReason::PoorQuality {
                text: "店".to_string()
            })
        );
    }

    #[test]
    fn test_low_density_is_poor_quality() {
        assert_eq!(
            run("Cafe 咖啡"),
            GateDecision::Reject(RejectReason::PoorQuality {
                text: "Cafe 咖啡".to_string()
            })
        );
    }

    #[test]
    fn test_artifacts_fail_quality() {
        let ranked = vec![RankedCandidate {
            text: "老王  火锅".to_string(),
            score: 50.0,
        }];
        let lines = vec![ClassifiedLine {
            text: "老王  火锅".to_string(),
            is_chinese: true,
        }];

        assert!(matches!(
            decide(&lines, &ranked),
            GateDecision::Reject(RejectReason::PoorQuality { .. })
        ));
    }

    #[test]
    fn test_cjk_punctuation_only_is_poor_quality() {
        for raw in ["「」", "。。"] {
            assert_eq!(
                run(raw),
                GateDecision::Reject(RejectReason::PoorQuality {
                    text: raw.to_string()
                })
            );
        }
    }

    #[test]
    fn test_poor_chinese_line_offers_other_lines() {
        assert_eq!(
            run("店\nKFC"),
            GateDecision::PromptSelection(vec!["店".to_string(), "KFC".to_string()])
        );
    }

    #[test]
    fn test_good_chinese_line_with_other_text_prompts() {
        assert_eq!(
            run("TEL 12345\n老王火锅店\nOPEN"),
            GateDecision::PromptSelection(vec![
                "老王火锅店".to_string(),
                "TEL 12345".to_string(),
                "OPEN".to_string(),
            ])
        );
    }

    #[test]
    fn test_passes_quality() {
        assert!(passes_quality("老王火锅店"));
        assert!(passes_quality("老王 火锅"));
        assert!(!passes_quality("店"));
        assert!(!passes_quality("KFC 店"));
        assert!(!passes_quality("。。"));
        assert!(passes_quality("老王火锅。"));
    }
}
