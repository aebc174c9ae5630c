//! Aggregate views over a reconciliation result.

use std::collections::{BTreeMap, BTreeSet};

use recon_model::{ConfirmedMatch, FieldMapping, QualityTier};
use serde::Serialize;

/// Matches scoring above this are high quality.
pub const HIGH_MATCH_SCORE: f64 = 0.8;
/// Matches scoring at least this are medium quality.
pub const MEDIUM_MATCH_SCORE: f64 = 0.6;
/// Fewer confirmed matches than this make mapping statistics unreliable.
pub const MIN_RELIABLE_MATCHES: usize = 10;

/// Score distribution of confirmed matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchQuality {
    pub total: usize,
    pub average_score: f64,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl MatchQuality {
    pub fn from_matches(matches: &[ConfirmedMatch]) -> Self {
        let mut quality = Self {
            total: matches.len(),
            ..Self::default()
        };
        if matches.is_empty() {
            return quality;
        }
        for confirmed in matches {
            if confirmed.score > HIGH_MATCH_SCORE {
                quality.high += 1;
            } else if confirmed.score >= MEDIUM_MATCH_SCORE {
                quality.medium += 1;
            } else {
                quality.low += 1;
            }
        }
        quality.average_score =
            matches.iter().map(|m| m.score).sum::<f64>() / matches.len() as f64;
        quality
    }
}

/// Next step suggested to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Most mappings are high quality; export them as a rule set.
    AdoptRuleSet,
    /// Keep only the high-confidence mappings.
    UseHighConfidenceOnly,
    /// Quality is mixed; review the mappings by hand.
    ReviewManually,
    /// No mappings were found.
    CleanAndRetry,
    /// Too few matches for reliable statistics.
    GatherMoreData,
    /// Match scores are low; clean up the name columns.
    NormalizeNames,
}

impl Recommendation {
    pub fn message(self) -> &'static str {
        match self {
            Self::AdoptRuleSet => "most mappings are high quality; export them as a rule set",
            Self::UseHighConfidenceOnly => "use only the high-confidence mappings",
            Self::ReviewManually => "mapping quality is mixed; review the mappings manually",
            Self::CleanAndRetry => "no mappings found; clean the data and retry",
            Self::GatherMoreData => "fewer than 10 matches; add more overlapping records",
            Self::NormalizeNames => "average match score is low; normalize the name columns",
        }
    }
}

/// Structural problems in a mapping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingWarning {
    NoMatches,
    /// A column of A maps to several columns of B.
    DuplicateColumnA { column: String, count: usize },
    /// A column of B is the target of several columns of A.
    DuplicateColumnB { column: String, count: usize },
    /// More than half of the mappings are below 0.5 confidence.
    MostlyLowConfidence { low: usize, total: usize },
}

impl std::fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatches => f.write_str("no confirmed matches"),
            Self::DuplicateColumnA { column, count } => {
                write!(f, "column '{column}' of A appears in {count} mappings")
            }
            Self::DuplicateColumnB { column, count } => {
                write!(f, "column '{column}' of B appears in {count} mappings")
            }
            Self::MostlyLowConfidence { low, total } => {
                write!(f, "{low} of {total} mappings are below 0.5 confidence")
            }
        }
    }
}

/// Overview of learned mappings and suggested next steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingSummary {
    pub match_quality: MatchQuality,
    pub total_mappings: usize,
    pub average_confidence: f64,
    pub tier_counts: BTreeMap<QualityTier, usize>,
    /// Share of A's columns that appear in some mapping.
    pub coverage_a: f64,
    /// Share of B's columns that appear in some mapping.
    pub coverage_b: f64,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<MappingWarning>,
}

impl MappingSummary {
    pub fn build(
        matches: &[ConfirmedMatch],
        mappings: &[FieldMapping],
        columns_a: usize,
        columns_b: usize,
    ) -> Self {
        let match_quality = MatchQuality::from_matches(matches);
        let mut tier_counts = BTreeMap::new();
        for mapping in mappings {
            *tier_counts.entry(mapping.quality_tier).or_default() += 1;
        }
        let average_confidence = if mappings.is_empty() {
            0.0
        } else {
            mappings.iter().map(|m| m.confidence).sum::<f64>() / mappings.len() as f64
        };
        let mapped_a: BTreeSet<&str> = mappings.iter().map(|m| m.column_a.as_str()).collect();
        let mapped_b: BTreeSet<&str> = mappings.iter().map(|m| m.column_b.as_str()).collect();

        let recommendations = recommend(&match_quality, mappings);
        let warnings = mapping_warnings(matches, mappings);

        Self {
            match_quality,
            total_mappings: mappings.len(),
            average_confidence,
            tier_counts,
            coverage_a: ratio(mapped_a.len(), columns_a),
            coverage_b: ratio(mapped_b.len(), columns_b),
            recommendations,
            warnings,
        }
    }

    pub fn tier_count(&self, tier: QualityTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Suggests next steps from match and mapping quality.
pub fn recommend(quality: &MatchQuality, mappings: &[FieldMapping]) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    if mappings.is_empty() {
        recommendations.push(Recommendation::CleanAndRetry);
    } else {
        let high = mappings
            .iter()
            .filter(|m| m.quality_tier == QualityTier::High)
            .count();
        let share = high as f64 / mappings.len() as f64;
        recommendations.push(if share > 0.8 {
            Recommendation::AdoptRuleSet
        } else if share > 0.5 {
            Recommendation::UseHighConfidenceOnly
        } else {
            Recommendation::ReviewManually
        });
    }
    if quality.total < MIN_RELIABLE_MATCHES {
        recommendations.push(Recommendation::GatherMoreData);
    }
    if quality.total > 0 && quality.average_score < HIGH_MATCH_SCORE {
        recommendations.push(Recommendation::NormalizeNames);
    }
    recommendations
}

/// Flags duplicate column usage and low overall confidence.
pub fn mapping_warnings(
    matches: &[ConfirmedMatch],
    mappings: &[FieldMapping],
) -> Vec<MappingWarning> {
    let mut warnings = Vec::new();
    if matches.is_empty() {
        warnings.push(MappingWarning::NoMatches);
    }

    let mut uses_a: BTreeMap<&str, usize> = BTreeMap::new();
    let mut uses_b: BTreeMap<&str, usize> = BTreeMap::new();
    for mapping in mappings {
        *uses_a.entry(&mapping.column_a).or_default() += 1;
        *uses_b.entry(&mapping.column_b).or_default() += 1;
    }
    warnings.extend(
        uses_a
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(column, count)| MappingWarning::DuplicateColumnA {
                column: column.to_string(),
                count,
            }),
    );
    warnings.extend(
        uses_b
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(column, count)| MappingWarning::DuplicateColumnB {
                column: column.to_string(),
                count,
            }),
    );

    let low = mappings.iter().filter(|m| m.confidence < 0.5).count();
    if !mappings.is_empty() && low * 2 > mappings.len() {
        warnings.push(MappingWarning::MostlyLowConfidence {
            low,
            total: mappings.len(),
        });
    }
    warnings
}
