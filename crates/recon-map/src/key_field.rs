//! Identity matching on classified name and date columns.

use std::collections::BTreeMap;

use recon_model::{
    Dataset, EvidenceKind, MatchCandidate, MatchEvidence, MatchStrategyKind, SemanticType, Side,
};
use recon_normalization::normalize;

use crate::classify::KeyFieldIndex;
use crate::strategy::{MatchStrategy, scan_pairs};

/// Score awarded for the first equal name pair.
pub const NAME_MATCH_SCORE: f64 = 1.0;
/// Bonus for an equal date pair, only counted after a name match.
pub const DATE_MATCH_BONUS: f64 = 0.1;

/// Matches records whose normalized names agree, with a date bonus.
///
/// Identifier columns are never consulted, including name or date columns
/// whose header also reads as an identifier: which identifiers correspond is
/// something the field-mapping learner discovers from the matches.
#[derive(Debug, Clone)]
pub struct KeyFieldMatcher {
    index: KeyFieldIndex,
    threshold: f64,
}

impl KeyFieldMatcher {
    pub fn new(index: KeyFieldIndex, threshold: f64) -> Self {
        Self { index, threshold }
    }

    /// True when both sides have a name column that is not also an identifier.
    pub fn is_usable(&self) -> bool {
        self.index
            .side_without_key_columns(SemanticType::Name)
            .is_none()
    }
}

impl MatchStrategy for KeyFieldMatcher {
    fn kind(&self) -> MatchStrategyKind {
        MatchStrategyKind::KeyField
    }

    fn generate_candidates(&self, a: &Dataset, b: &Dataset) -> Vec<MatchCandidate> {
        if !self.is_usable() {
            return Vec::new();
        }
        let names_a = NormalizedColumns::build(&self.index, Side::A, SemanticType::Name, a);
        let names_b = NormalizedColumns::build(&self.index, Side::B, SemanticType::Name, b);
        let dates_a = NormalizedColumns::build(&self.index, Side::A, SemanticType::Date, a);
        let dates_b = NormalizedColumns::build(&self.index, Side::B, SemanticType::Date, b);

        let raw = scan_pairs(a, b, |index_a, index_b| {
            let name = first_agreement(&names_a, index_a, &names_b, index_b)?;
            let mut score = NAME_MATCH_SCORE;
            let mut evidence = vec![name];
            if let Some(date) = first_agreement(&dates_a, index_a, &dates_b, index_b) {
                score += DATE_MATCH_BONUS;
                evidence.push(date);
            }
            (score >= self.threshold).then_some(MatchCandidate {
                index_a,
                index_b,
                score,
                evidence,
            })
        });
        consolidate(raw)
    }
}

/// Keeps the best candidate per normalized name value.
///
/// A dataset may list one entity several times (per print run, per shop);
/// only the highest scoring pair for a name survives, earliest on ties.
pub fn consolidate(candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut slots: BTreeMap<String, usize> = BTreeMap::new();
    let mut kept: Vec<MatchCandidate> = Vec::new();
    for candidate in candidates {
        let key = name_value(&candidate).to_string();
        match slots.get(&key) {
            Some(&slot) => {
                if candidate.score > kept[slot].score {
                    kept[slot] = candidate;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }
    kept
}

fn name_value(candidate: &MatchCandidate) -> &str {
    candidate
        .evidence
        .iter()
        .find(|evidence| evidence.kind == EvidenceKind::Field(SemanticType::Name))
        .map(|evidence| evidence.value.as_str())
        .unwrap_or("")
}

/// Normalized values of every column of one semantic type, per record.
struct NormalizedColumns {
    semantic: SemanticType,
    columns: Vec<(String, Vec<String>)>,
}

impl NormalizedColumns {
    fn build(index: &KeyFieldIndex, side: Side, semantic: SemanticType, dataset: &Dataset) -> Self {
        let columns = index
            .key_columns(side, semantic)
            .into_iter()
            .filter_map(|column| {
                let position = dataset.headers().position(column)?;
                let values = dataset
                    .records()
                    .iter()
                    .map(|record| normalize(record.value_at(position), semantic))
                    .collect();
                Some((column.to_string(), values))
            })
            .collect();
        Self { semantic, columns }
    }
}

fn first_agreement(
    left: &NormalizedColumns,
    index_a: usize,
    right: &NormalizedColumns,
    index_b: usize,
) -> Option<MatchEvidence> {
    for (column_a, values_a) in &left.columns {
        let value_a = &values_a[index_a];
        if value_a.is_empty() {
            continue;
        }
        for (column_b, values_b) in &right.columns {
            if *value_a == values_b[index_b] {
                return Some(MatchEvidence {
                    column_a: column_a.clone(),
                    column_b: column_b.clone(),
                    kind: EvidenceKind::Field(left.semantic),
                    value: value_a.clone(),
                    similarity: 1.0,
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index_a: usize, index_b: usize, score: f64, name: &str) -> MatchCandidate {
        MatchCandidate {
            index_a,
            index_b,
            score,
            evidence: vec![MatchEvidence {
                column_a: "name".to_string(),
                column_b: "title".to_string(),
                kind: EvidenceKind::Field(SemanticType::Name),
                value: name.to_string(),
                similarity: 1.0,
            }],
        }
    }

    #[test]
    fn consolidation_keeps_best_per_name() {
        let kept = consolidate(vec![
            candidate(0, 0, 1.0, "fire dragon"),
            candidate(0, 1, 1.1, "fire dragon"),
            candidate(1, 2, 1.0, "water turtle"),
            candidate(2, 1, 1.1, "fire dragon"),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!((kept[0].index_a, kept[0].index_b), (0, 1));
        assert_eq!((kept[1].index_a, kept[1].index_b), (1, 2));
    }
}
