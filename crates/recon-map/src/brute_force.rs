//! Exhaustive identity matching over every column pair.
//!
//! Each record pair is scored by comparing every column of A with every
//! column of B. Comparisons are classified ([`MatchClass`]) and weighted; the
//! row score averages the weighted similarities and rewards rows with several
//! strong agreements.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use recon_model::{
    Dataset, EvidenceKind, MatchCandidate, MatchClass, MatchEvidence, MatchStrategyKind, Record,
};
use recon_normalization::extract_numeric;
use tracing::{debug, warn};

use crate::scorer::{FieldPair, MIN_SCORER_CONFIDENCE, PairScore, PairScorer};
use crate::similarity::{clean_text, levenshtein_ratio, similarity};
use crate::strategy::{MatchStrategy, scan_pairs};

/// Values shorter than this many characters are ignored.
pub const MIN_VALUE_CHARS: usize = 2;
/// Comparisons at or below this similarity are discarded.
pub const COMPARISON_FLOOR: f64 = 0.5;
/// Weighted comparisons above this count as strong agreements.
pub const STRONG_AGREEMENT: f64 = 0.8;

const SUBSTRING_SCORE: f64 = 0.8;
const SUBSTRING_MIN_CHARS: usize = 3;
const NUMERIC_CLOSE_RATIO: f64 = 0.1;
const WORD_FUZZY_MIN: f64 = 0.8;

/// Outcome of comparing two cell values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub similarity: f64,
    pub class: MatchClass,
}

impl Comparison {
    pub fn weighted(&self) -> f64 {
        self.similarity * self.class.weight()
    }
}

/// Every measure taken for one value pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Measures {
    exact: f64,
    fuzzy: f64,
    partial: f64,
    composite: f64,
    numeric_exact: f64,
    numeric_close: f64,
    normalized: f64,
    substring: f64,
    word_level: f64,
}

impl Measures {
    fn take(a: &str, b: &str) -> Self {
        let toolkit = similarity(a, b);
        let mut measures = Self {
            exact: if a == b { 1.0 } else { 0.0 },
            fuzzy: nonempty_fuzzy(a, b),
            partial: toolkit.partial,
            composite: toolkit.composite,
            ..Self::default()
        };
        if let (Some(num_a), Some(num_b)) = (extract_numeric(a), extract_numeric(b)) {
            if (num_a - num_b).abs() < f64::EPSILON {
                measures.numeric_exact = 1.0;
            } else if num_a > 0.0 && num_b > 0.0 {
                let diff_ratio = (num_a - num_b).abs() / num_a.max(num_b);
                if diff_ratio < NUMERIC_CLOSE_RATIO {
                    measures.numeric_close = 1.0 - diff_ratio;
                }
            }
        }
        let symbol_free_a = strip_symbols(a);
        let symbol_free_b = strip_symbols(b);
        if !symbol_free_a.is_empty() && !symbol_free_b.is_empty() {
            measures.normalized = levenshtein_ratio(&symbol_free_a, &symbol_free_b);
        }
        if a.chars().count() >= SUBSTRING_MIN_CHARS
            && b.chars().count() >= SUBSTRING_MIN_CHARS
            && (a.contains(b) || b.contains(a))
        {
            measures.substring = SUBSTRING_SCORE;
        }
        measures.word_level = word_level(a, b);
        measures
    }

    fn max(&self) -> f64 {
        [
            self.exact,
            self.fuzzy,
            self.partial,
            self.composite,
            self.numeric_exact,
            self.numeric_close,
            self.normalized,
            self.substring,
            self.word_level,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    fn classify(&self) -> MatchClass {
        if self.exact >= 1.0 {
            MatchClass::Exact
        } else if self.numeric_exact >= 1.0 {
            MatchClass::Numeric
        } else if self.normalized > 0.9 {
            MatchClass::Normalized
        } else if self.substring > 0.7 {
            MatchClass::Substring
        } else if self.word_level > 0.8 {
            MatchClass::Word
        } else if self.max() > 0.7 {
            MatchClass::Fuzzy
        } else {
            MatchClass::Weak
        }
    }
}

/// Compares two values with the library measures.
///
/// Returns `None` when either value is too short or the best measure does not
/// exceed [`COMPARISON_FLOOR`].
pub fn compare_values(a: &str, b: &str) -> Option<Comparison> {
    if !is_comparable(a) || !is_comparable(b) {
        return None;
    }
    let measures = Measures::take(a, b);
    let similarity = measures.max();
    (similarity > COMPARISON_FLOOR).then(|| Comparison {
        similarity,
        class: measures.classify(),
    })
}

/// Aggregates the retained comparisons of one record pair.
pub fn row_score(comparisons: &[Comparison]) -> f64 {
    if comparisons.is_empty() {
        return 0.0;
    }
    let total: f64 = comparisons.iter().map(Comparison::weighted).sum();
    let strong = comparisons
        .iter()
        .filter(|comparison| comparison.weighted() > STRONG_AGREEMENT)
        .count();
    let average = total / comparisons.len() as f64;
    match strong {
        0 => average,
        1 => (average + 0.1).min(0.85),
        _ => (average + 0.2).min(0.95),
    }
}

fn is_comparable(value: &str) -> bool {
    value.chars().count() >= MIN_VALUE_CHARS
}

fn nonempty_fuzzy(a: &str, b: &str) -> f64 {
    let clean_a = clean_text(a);
    let clean_b = clean_text(b);
    if clean_a.is_empty() || clean_b.is_empty() {
        return 0.0;
    }
    levenshtein_ratio(&clean_a, &clean_b)
}

fn strip_symbols(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_')
        .collect()
}

/// Share of words in A with a close counterpart in B.
fn word_level(a: &str, b: &str) -> f64 {
    let words_a: Vec<&str> = a.split_whitespace().collect();
    let words_b: Vec<&str> = b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let matched = words_a
        .iter()
        .filter(|word_a| {
            words_b
                .iter()
                .any(|word_b| nonempty_fuzzy(word_a, word_b) > WORD_FUZZY_MIN)
        })
        .count();
    matched as f64 / words_a.len().max(words_b.len()) as f64
}

/// Matches records by comparing all columns, optionally consulting an
/// external [`PairScorer`].
pub struct BruteForceMatcher {
    threshold: f64,
    scorer: Option<Arc<dyn PairScorer>>,
    scorer_fallbacks: AtomicUsize,
}

impl std::fmt::Debug for BruteForceMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BruteForceMatcher")
            .field("threshold", &self.threshold)
            .field("scorer", &self.scorer.is_some())
            .finish()
    }
}

impl BruteForceMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            scorer: None,
            scorer_fallbacks: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: Option<Arc<dyn PairScorer>>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Number of record pairs scored locally because the external scorer failed.
    pub fn scorer_fallbacks(&self) -> usize {
        self.scorer_fallbacks.load(Ordering::Relaxed)
    }

    fn score_pair(
        &self,
        a: &Dataset,
        b: &Dataset,
        index_a: usize,
        index_b: usize,
    ) -> Option<MatchCandidate> {
        let record_a = &a.records()[index_a];
        let record_b = &b.records()[index_b];
        let pairs = comparable_pairs(record_a, record_b);
        if pairs.is_empty() {
            return None;
        }
        let external = self.external_scores(&pairs);
        let mut comparisons = Vec::new();
        let mut evidence = Vec::new();
        for (idx, pair) in pairs.iter().enumerate() {
            let verdict = external.as_ref().and_then(|scores| scores.get(&idx));
            let comparison = match verdict.map(external_verdict) {
                Some(Verdict::Similar(comparison)) => Some(comparison),
                Some(Verdict::Dissimilar) => None,
                Some(Verdict::Untrusted) | None => compare_values(pair.value_a, pair.value_b),
            };
            let Some(comparison) = comparison else {
                continue;
            };
            comparisons.push(comparison);
            evidence.push(MatchEvidence {
                column_a: pair.column_a.to_string(),
                column_b: pair.column_b.to_string(),
                kind: EvidenceKind::Class(comparison.class),
                value: pair.value_a.to_string(),
                similarity: comparison.similarity,
            });
        }
        let score = row_score(&comparisons);
        (score > self.threshold).then_some(MatchCandidate {
            index_a,
            index_b,
            score,
            evidence,
        })
    }

    fn external_scores(
        &self,
        pairs: &[FieldPair<'_>],
    ) -> Option<BTreeMap<usize, PairScore>> {
        let scorer = self.scorer.as_ref()?;
        match scorer.score_field_pairs(pairs) {
            Ok(scores) => Some(scores),
            Err(error) => {
                let previous = self.scorer_fallbacks.fetch_add(1, Ordering::Relaxed);
                if previous == 0 {
                    warn!(%error, "external scorer failed, using library scoring");
                } else {
                    debug!(%error, "external scorer failed again");
                }
                None
            }
        }
    }
}

/// How an external verdict enters the row score.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verdict {
    Similar(Comparison),
    /// A confident verdict at or below the comparison floor.
    Dissimilar,
    /// Low confidence or a non-finite similarity; library scoring decides.
    Untrusted,
}

fn external_verdict(score: &PairScore) -> Verdict {
    if score.confidence < MIN_SCORER_CONFIDENCE
        || !score.confidence.is_finite()
        || !score.similarity.is_finite()
    {
        return Verdict::Untrusted;
    }
    let similarity = score.similarity.clamp(0.0, 1.0);
    if similarity > COMPARISON_FLOOR {
        Verdict::Similar(Comparison {
            similarity,
            class: score.match_class,
        })
    } else {
        Verdict::Dissimilar
    }
}

fn comparable_pairs<'r>(record_a: &'r Record, record_b: &'r Record) -> Vec<FieldPair<'r>> {
    let mut pairs = Vec::new();
    for (column_a, value_a) in record_a.iter() {
        let value_a = value_a.trim();
        if !is_comparable(value_a) {
            continue;
        }
        for (column_b, value_b) in record_b.iter() {
            let value_b = value_b.trim();
            if !is_comparable(value_b) {
                continue;
            }
            pairs.push(FieldPair {
                column_a,
                column_b,
                value_a,
                value_b,
            });
        }
    }
    pairs
}

impl MatchStrategy for BruteForceMatcher {
    fn kind(&self) -> MatchStrategyKind {
        MatchStrategyKind::BruteForce
    }

    fn generate_candidates(&self, a: &Dataset, b: &Dataset) -> Vec<MatchCandidate> {
        scan_pairs(a, b, |index_a, index_b| self.score_pair(a, b, index_a, index_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_are_skipped() {
        assert!(compare_values("A", "A").is_none());
        assert!(compare_values("", "xx").is_none());
    }

    #[test]
    fn exact_values_classify_as_exact() {
        let comparison = compare_values("Fire Dragon", "Fire Dragon").expect("comparison");
        assert_eq!(comparison.class, MatchClass::Exact);
        assert!((comparison.similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn equal_prices_classify_as_numeric() {
        let comparison = compare_values("¥1,200", "1200円").expect("comparison");
        assert_eq!(comparison.class, MatchClass::Numeric);
        assert!((comparison.similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn case_and_symbol_differences_are_normalized() {
        let comparison = compare_values("Fire-Dragon", "fire dragon").expect("comparison");
        assert_eq!(comparison.class, MatchClass::Normalized);
    }

    #[test]
    fn containment_is_substring() {
        let comparison = compare_values("Dragon", "Ancient Dragon Lord").expect("comparison");
        assert_eq!(comparison.class, MatchClass::Substring);
        assert!((comparison.similarity - 0.8).abs() < 1e-9);
    }

    #[test]
    fn unrelated_values_are_discarded() {
        assert!(compare_values("PK001", "Water Turtle").is_none());
    }

    fn verdict(similarity: f64, confidence: f64) -> Verdict {
        external_verdict(&PairScore {
            similarity,
            match_class: MatchClass::Fuzzy,
            confidence,
        })
    }

    #[test]
    fn external_verdicts_need_confidence() {
        assert_eq!(verdict(0.9, 0.1), Verdict::Untrusted);
        assert_eq!(verdict(f64::NAN, 0.9), Verdict::Untrusted);
        assert_eq!(verdict(0.0, 0.9), Verdict::Dissimilar);
        assert_eq!(
            verdict(0.9, 0.9),
            Verdict::Similar(Comparison {
                similarity: 0.9,
                class: MatchClass::Fuzzy,
            })
        );
    }

    #[test]
    fn row_score_rewards_strong_agreements() {
        let exact = Comparison {
            similarity: 1.0,
            class: MatchClass::Exact,
        };
        let weak = Comparison {
            similarity: 0.6,
            class: MatchClass::Weak,
        };
        assert!((row_score(&[exact, exact]) - 0.95).abs() < 1e-9);
        assert!((row_score(&[exact, weak]) - 0.75).abs() < 1e-9);
        assert!((row_score(&[weak]) - 0.3).abs() < 1e-9);
        assert!(row_score(&[]).abs() < 1e-9);
    }
}
