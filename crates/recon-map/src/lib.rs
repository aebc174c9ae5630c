//! Entity resolution and schema mapping between two catalogs.
//!
//! A run classifies the columns of both datasets, generates candidate record
//! pairs with one [`MatchStrategy`], assigns them one-to-one and learns which
//! columns correspond from the confirmed matches:
//!
//! ```text
//! classify -> generate_candidates -> assign -> learn_mappings
//! ```
//!
//! [`ReconEngine`] wires the stages together; each stage is also usable on
//! its own.

pub mod assignment;
pub mod brute_force;
pub mod classify;
pub mod engine;
pub mod key_field;
pub mod learner;
pub mod rules;
pub mod scorer;
pub mod similarity;
pub mod strategy;
pub mod summary;

pub use assignment::assign;
pub use brute_force::{BruteForceMatcher, Comparison, compare_values, row_score};
pub use classify::{
    KeyFieldIndex, Refinement, RefinementReason, SideFields, classify, classify_column,
    is_identifier_column, refine_with_samples,
};
pub use engine::{InconclusiveReason, Outcome, ReconEngine, ReconResult, reconcile};
pub use key_field::KeyFieldMatcher;
pub use learner::{learn_mappings, mutual_information};
pub use rules::{DEFAULT_RULE_THRESHOLD, MappingRule, MappingRuleSet, export_rules, export_rules_at};
pub use scorer::{FieldPair, PairScore, PairScorer};
pub use similarity::{SimilarityScores, similarity};
pub use strategy::MatchStrategy;
pub use summary::{MappingSummary, MappingWarning, MatchQuality, Recommendation};
