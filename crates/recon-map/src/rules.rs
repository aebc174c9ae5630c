//! Export of learned mappings as a reusable rule set.

use chrono::{DateTime, SecondsFormat, Utc};
use recon_model::{FieldMapping, MatchStrategyKind, QualityTier};
use serde::{Deserialize, Serialize};

/// Rule-set format version.
pub const RULE_SET_VERSION: &str = "1.0";
/// Default minimum confidence for a mapping to become a rule.
pub const DEFAULT_RULE_THRESHOLD: f64 = 0.8;
/// Rules at or above this confidence count as high quality.
pub const HIGH_QUALITY_RULE: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub rule_id: String,
    pub source_column: String,
    pub target_column: String,
    pub confidence: f64,
    pub quality_tier: QualityTier,
    pub is_identifier_field: bool,
    pub sample_count: usize,
    pub total_comparisons: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetMetadata {
    pub average_confidence: f64,
    pub high_quality_rules: usize,
    pub strategy: MatchStrategyKind,
}

/// Versioned set of column mapping rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRuleSet {
    pub version: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub confidence_threshold: f64,
    pub total_rules: usize,
    pub rules: Vec<MappingRule>,
    pub metadata: RuleSetMetadata,
}

/// Exports mappings at or above `threshold`, stamped with the current time.
pub fn export_rules(
    mappings: &[FieldMapping],
    threshold: f64,
    strategy: MatchStrategyKind,
) -> MappingRuleSet {
    export_rules_at(mappings, threshold, strategy, Utc::now())
}

/// Exports mappings at or above `threshold` with an explicit timestamp.
pub fn export_rules_at(
    mappings: &[FieldMapping],
    threshold: f64,
    strategy: MatchStrategyKind,
    created_at: DateTime<Utc>,
) -> MappingRuleSet {
    let rules: Vec<MappingRule> = mappings
        .iter()
        .filter(|mapping| mapping.confidence >= threshold)
        .enumerate()
        .map(|(index, mapping)| MappingRule {
            rule_id: format!("rule_{}", index + 1),
            source_column: mapping.column_a.clone(),
            target_column: mapping.column_b.clone(),
            confidence: mapping.confidence,
            quality_tier: mapping.quality_tier,
            is_identifier_field: mapping.is_identifier_field,
            sample_count: mapping.sample_count,
            total_comparisons: mapping.total_comparisons,
            active: true,
        })
        .collect();

    let average_confidence = if rules.is_empty() {
        0.0
    } else {
        rules.iter().map(|rule| rule.confidence).sum::<f64>() / rules.len() as f64
    };
    let high_quality_rules = rules
        .iter()
        .filter(|rule| rule.confidence >= HIGH_QUALITY_RULE)
        .count();

    MappingRuleSet {
        version: RULE_SET_VERSION.to_string(),
        created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        confidence_threshold: threshold,
        total_rules: rules.len(),
        rules,
        metadata: RuleSetMetadata {
            average_confidence,
            high_quality_rules,
            strategy,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn mapping(a: &str, b: &str, confidence: f64) -> FieldMapping {
        FieldMapping {
            column_a: a.to_string(),
            column_b: b.to_string(),
            confidence,
            sample_count: 9,
            total_comparisons: 10,
            quality_tier: QualityTier::High,
            is_identifier_field: false,
            mutual_information: None,
            value_diversity_ratio: None,
            samples: Vec::new(),
        }
    }

    #[test]
    fn exports_mappings_above_threshold() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let set = export_rules_at(
            &[
                mapping("name", "title", 0.95),
                mapping("price", "cost", 0.8),
                mapping("memo", "note", 0.6),
            ],
            DEFAULT_RULE_THRESHOLD,
            MatchStrategyKind::KeyField,
            created,
        );
        assert_eq!(set.version, "1.0");
        assert_eq!(set.created_at, "2024-03-01T12:00:00Z");
        assert_eq!(set.total_rules, 2);
        assert_eq!(set.rules[1].rule_id, "rule_2");
        assert_eq!(set.rules[1].source_column, "price");
        assert_eq!(set.metadata.high_quality_rules, 1);
        assert!((set.metadata.average_confidence - 0.875).abs() < 1e-9);
    }

    #[test]
    fn rule_set_serializes_strategy_name() {
        let set = export_rules_at(
            &[],
            0.5,
            MatchStrategyKind::BruteForce,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["metadata"]["strategy"], "brute_force");
        assert_eq!(json["total_rules"], 0);
    }
}
