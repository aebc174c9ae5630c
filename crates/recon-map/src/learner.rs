//! Field-mapping inference over confirmed matches.
//!
//! Two passes run over every (column of A, column of B) pair:
//!
//! - **exact agreement**: the share of comparable value pairs that are equal
//!   under [`normalize_for_comparison`];
//! - **co-occurrence**: mutual information between the two columns' values,
//!   which catches columns that correspond without sharing a vocabulary
//!   (codes on one side, labels on the other).
//!
//! A value pair is comparable when both values are non-empty. Column pairs
//! without a single comparable pair produce nothing.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use recon_model::{ConfirmedMatch, Dataset, FieldMapping, QualityTier, ReconConfig, ValuePair};
use recon_normalization::normalize_for_comparison;
use tracing::debug;

use crate::classify::is_identifier_column;

/// Sample value pairs kept per exact-agreement mapping.
pub const SAMPLE_PAIRS: usize = 3;

/// Mutual information (bits) that maps to full co-occurrence confidence.
pub const MI_SCALE: f64 = 2.0;

/// Learns column correspondences from confirmed record matches.
///
/// The result is sorted by confidence, highest first; ties keep column
/// order (A, then B).
pub fn learn_mappings(
    matches: &[ConfirmedMatch],
    a: &Dataset,
    b: &Dataset,
    config: &ReconConfig,
) -> Vec<FieldMapping> {
    if matches.is_empty() {
        return Vec::new();
    }

    let columns_a = MatchedColumns::collect(a, matches.iter().map(|m| m.index_a));
    let columns_b = MatchedColumns::collect(b, matches.iter().map(|m| m.index_b));

    let per_column: Vec<(Vec<FieldMapping>, Vec<FieldMapping>)> = (0..columns_a.len())
        .into_par_iter()
        .map(|position_a| {
            let mut exact = Vec::new();
            let mut cooccurrence = Vec::new();
            for position_b in 0..columns_b.len() {
                let tally = PairTally::observe(&columns_a, position_a, &columns_b, position_b);
                if tally.comparisons == 0 {
                    continue;
                }
                let column_a = &a.headers().as_slice()[position_a];
                let column_b = &b.headers().as_slice()[position_b];
                if let Some(mapping) = tally.exact_mapping(column_a, column_b, config) {
                    exact.push(mapping);
                }
                if let Some(mapping) = tally.cooccurrence_mapping(column_a, column_b, config) {
                    cooccurrence.push(mapping);
                }
            }
            (exact, cooccurrence)
        })
        .collect();

    let (exact, cooccurrence): (Vec<_>, Vec<_>) = per_column.into_iter().unzip();
    let exact: Vec<FieldMapping> = exact.into_iter().flatten().collect();
    let cooccurrence: Vec<FieldMapping> = cooccurrence.into_iter().flatten().collect();
    debug!(
        matches = matches.len(),
        exact = exact.len(),
        cooccurrence = cooccurrence.len(),
        "field mapping passes complete"
    );

    merge(exact, cooccurrence)
}

/// Appends co-occurrence mappings for column pairs the exact pass missed,
/// then sorts by confidence descending.
pub fn merge(exact: Vec<FieldMapping>, cooccurrence: Vec<FieldMapping>) -> Vec<FieldMapping> {
    let known: BTreeSet<(String, String)> = exact
        .iter()
        .map(|mapping| (mapping.column_a.clone(), mapping.column_b.clone()))
        .collect();
    let mut merged = exact;
    merged.extend(cooccurrence.into_iter().filter(|mapping| {
        !known.contains(&(mapping.column_a.clone(), mapping.column_b.clone()))
    }));
    merged.sort_by(|left, right| right.confidence.total_cmp(&left.confidence));
    merged
}

/// Quality tier of an exact-agreement confidence.
pub fn exact_tier(confidence: f64) -> QualityTier {
    if confidence > 0.8 {
        QualityTier::High
    } else if confidence >= 0.5 {
        QualityTier::Medium
    } else {
        QualityTier::Low
    }
}

/// Mutual information in bits between paired observations, clipped at zero.
pub fn mutual_information<K: Ord, V: Ord>(pairs: impl IntoIterator<Item = (K, V)>) -> f64
where
    K: Clone,
    V: Clone,
{
    let mut joint: BTreeMap<(K, V), usize> = BTreeMap::new();
    let mut left: BTreeMap<K, usize> = BTreeMap::new();
    let mut right: BTreeMap<V, usize> = BTreeMap::new();
    let mut total = 0usize;
    for (key, value) in pairs {
        *left.entry(key.clone()).or_default() += 1;
        *right.entry(value.clone()).or_default() += 1;
        *joint.entry((key, value)).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    let information: f64 = joint
        .iter()
        .map(|((key, value), &count)| {
            let p_joint = count as f64 / n;
            let p_left = left[key] as f64 / n;
            let p_right = right[value] as f64 / n;
            p_joint * (p_joint / (p_left * p_right)).log2()
        })
        .sum();
    information.max(0.0)
}

/// Raw and comparison-normalized values of matched records, per column.
struct MatchedColumns<'a> {
    raw: Vec<Vec<&'a str>>,
    normalized: Vec<Vec<String>>,
}

impl<'a> MatchedColumns<'a> {
    fn collect(dataset: &'a Dataset, indices: impl Iterator<Item = usize> + Clone) -> Self {
        let raw: Vec<Vec<&'a str>> = (0..dataset.headers().len())
            .map(|position| {
                indices
                    .clone()
                    .map(|index| dataset.records()[index].value_at(position))
                    .collect()
            })
            .collect();
        let normalized = raw
            .iter()
            .map(|values| values.iter().map(|value| normalize_for_comparison(value)).collect())
            .collect();
        Self { raw, normalized }
    }

    fn len(&self) -> usize {
        self.raw.len()
    }
}

/// Statistics of one column pair over all confirmed matches.
struct PairTally<'a> {
    comparisons: usize,
    agreements: usize,
    samples: Vec<ValuePair>,
    observed: Vec<(&'a str, &'a str)>,
}

impl<'a> PairTally<'a> {
    fn observe(
        left: &'a MatchedColumns<'_>,
        position_a: usize,
        right: &'a MatchedColumns<'_>,
        position_b: usize,
    ) -> Self {
        let mut tally = Self {
            comparisons: 0,
            agreements: 0,
            samples: Vec::new(),
            observed: Vec::new(),
        };
        let normalized_a = &left.normalized[position_a];
        let normalized_b = &right.normalized[position_b];
        for (slot, (value_a, value_b)) in normalized_a.iter().zip(normalized_b).enumerate() {
            if value_a.is_empty() || value_b.is_empty() {
                continue;
            }
            tally.comparisons += 1;
            tally.observed.push((value_a.as_str(), value_b.as_str()));
            if value_a == value_b {
                tally.agreements += 1;
                if tally.samples.len() < SAMPLE_PAIRS {
                    tally.samples.push(ValuePair {
                        value_a: left.raw[position_a][slot].to_string(),
                        value_b: right.raw[position_b][slot].to_string(),
                    });
                }
            }
        }
        tally
    }

    fn exact_mapping(
        &self,
        column_a: &str,
        column_b: &str,
        config: &ReconConfig,
    ) -> Option<FieldMapping> {
        let confidence = self.agreements as f64 / self.comparisons as f64;
        if confidence < config.field_mapping_min_confidence {
            return None;
        }
        let is_identifier_field = is_identifier_column(column_a) || is_identifier_column(column_b);
        let quality_tier = if is_identifier_field {
            QualityTier::IdField
        } else {
            exact_tier(confidence)
        };
        Some(FieldMapping {
            column_a: column_a.to_string(),
            column_b: column_b.to_string(),
            confidence,
            sample_count: self.agreements,
            total_comparisons: self.comparisons,
            quality_tier,
            is_identifier_field,
            mutual_information: None,
            value_diversity_ratio: None,
            samples: self.samples.clone(),
        })
    }

    fn cooccurrence_mapping(
        &self,
        column_a: &str,
        column_b: &str,
        config: &ReconConfig,
    ) -> Option<FieldMapping> {
        let information = mutual_information(self.observed.iter().copied());
        let confidence = (information / MI_SCALE).min(1.0);
        if confidence <= config.cooccurrence_min_confidence {
            return None;
        }
        let distinct: BTreeSet<&(&str, &str)> = self.observed.iter().collect();
        Some(FieldMapping {
            column_a: column_a.to_string(),
            column_b: column_b.to_string(),
            confidence,
            sample_count: self.comparisons,
            total_comparisons: self.comparisons,
            quality_tier: QualityTier::Cooccurrence,
            is_identifier_field: is_identifier_column(column_a) || is_identifier_column(column_b),
            mutual_information: Some(information),
            value_diversity_ratio: Some(distinct.len() as f64 / self.comparisons as f64),
            samples: Vec::new(),
        })
    }
}
