//! Text Layer
//!
//! Pure processing of recognized text: line classification, place-name
//! ranking, the quality gate, pinyin romanization and the fallback glossary.
//! Nothing in here performs I/O.

pub mod classify;
pub mod gate;
pub mod glossary;
pub mod ranking;
pub mod romanize;

pub use classify::{classify, clean_line, ClassifiedLine};
pub use gate::{decide, GateDecision, RejectReason};
pub use ranking::{rank, RankedCandidate, RANKING_VERSION};
pub use romanize::{to_pinyin, RomanizeOptions};

/// Run classification and ranking over a raw recognition result
///
/// Returns the classified lines together with the ranked Chinese candidates,
/// ready for [`decide`].
pub fn analyze(raw: &str) -> (Vec<ClassifiedLine>, Vec<RankedCandidate>) {
    let lines = classify(raw);
    let chinese: Vec<String> = lines
        .iter()
        .filter(|line| line.is_chinese)
        .map(|line| line.text.clone())
        .collect();
    let ranked = rank(&chinese);
    (lines, ranked)
}
