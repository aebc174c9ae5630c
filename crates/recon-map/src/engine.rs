//! The reconciliation pipeline: classify, match, assign, learn.

use std::sync::Arc;
use std::time::Instant;

use recon_model::{
    ConfirmedMatch, Dataset, FieldMapping, HeaderSet, MatchStrategyKind, ReconConfig, Record,
    Result, SemanticType, Side,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::assignment::assign;
use crate::brute_force::BruteForceMatcher;
use crate::classify::{KeyFieldIndex, Refinement, classify, refine_with_samples};
use crate::key_field::KeyFieldMatcher;
use crate::learner::learn_mappings;
use crate::scorer::PairScorer;
use crate::strategy::MatchStrategy;
use crate::summary::MappingSummary;

/// Why a run produced no matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InconclusiveReason {
    /// Key-field matching needs a name column on both sides.
    NoNameColumns { side: Side },
    /// Candidate generation and assignment left nothing.
    NoConfirmedMatches,
}

impl std::fmt::Display for InconclusiveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoNameColumns { side } => write!(f, "dataset {side} has no name column"),
            Self::NoConfirmedMatches => f.write_str("no record pairs matched"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Matched,
    Inconclusive { reason: InconclusiveReason },
}

impl Outcome {
    pub fn is_matched(self) -> bool {
        self == Self::Matched
    }
}

/// Everything a reconciliation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    /// The strategy whose candidates were assigned.
    pub strategy: MatchStrategyKind,
    pub outcome: Outcome,
    pub key_fields: KeyFieldIndex,
    /// Advisory column reclassifications from sampled values.
    pub refinements: Vec<Refinement>,
    pub candidate_count: usize,
    pub matches: Vec<ConfirmedMatch>,
    /// Sorted by confidence, highest first.
    pub mappings: Vec<FieldMapping>,
    /// Record pairs scored locally after the external scorer failed.
    pub scorer_fallbacks: usize,
    /// True when key-field matching was inconclusive and brute force was retried.
    pub fell_back: bool,
}

impl ReconResult {
    pub fn summarize(&self, a: &Dataset, b: &Dataset) -> MappingSummary {
        MappingSummary::build(&self.matches, &self.mappings, a.headers().len(), b.headers().len())
    }
}

/// Runs reconciliations with one configuration.
#[derive(Clone)]
pub struct ReconEngine {
    config: ReconConfig,
    scorer: Option<Arc<dyn PairScorer>>,
}

impl std::fmt::Debug for ReconEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconEngine")
            .field("config", &self.config)
            .field("scorer", &self.scorer.is_some())
            .finish()
    }
}

struct StrategyRun {
    candidate_count: usize,
    matches: Vec<ConfirmedMatch>,
    scorer_fallbacks: usize,
}

impl ReconEngine {
    /// # Errors
    ///
    /// Returns [`recon_model::ReconError::InvalidConfig`] when a threshold is out of range.
    pub fn new(config: ReconConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer: None,
        })
    }

    /// Consults `scorer` during brute-force matching.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn PairScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Validates raw headers and records, then runs the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input [`recon_model::ReconError`] for empty or duplicate headers
    /// and for records that do not align with their headers.
    pub fn reconcile(
        &self,
        headers_a: Vec<String>,
        records_a: Vec<Record>,
        headers_b: Vec<String>,
        records_b: Vec<Record>,
    ) -> Result<ReconResult> {
        let a = Dataset::new(Side::A, HeaderSet::new(headers_a), records_a)?;
        let b = Dataset::new(Side::B, HeaderSet::new(headers_b), records_b)?;
        Ok(self.run(&a, &b))
    }

    /// Runs the pipeline on validated datasets.
    pub fn run(&self, a: &Dataset, b: &Dataset) -> ReconResult {
        let span = info_span!(
            "reconcile",
            strategy = self.config.match_strategy.as_str(),
            rows_a = a.len(),
            rows_b = b.len()
        );
        let _guard = span.enter();
        let start = Instant::now();

        let key_fields = classify(a.headers().iter(), b.headers().iter());
        let mut refinements = refine_with_samples(a, &key_fields.a);
        refinements.extend(refine_with_samples(b, &key_fields.b));
        debug!(
            name_columns_a = key_fields.a.columns(SemanticType::Name).len(),
            name_columns_b = key_fields.b.columns(SemanticType::Name).len(),
            refinements = refinements.len(),
            "classified columns"
        );

        let mut strategy = self.config.match_strategy;
        let mut fell_back = false;
        let mut inconclusive = None;
        let mut run = StrategyRun {
            candidate_count: 0,
            matches: Vec::new(),
            scorer_fallbacks: 0,
        };

        if strategy == MatchStrategyKind::KeyField {
            let matcher =
                KeyFieldMatcher::new(key_fields.clone(), self.config.key_field_match_threshold);
            match key_fields.side_without_key_columns(SemanticType::Name) {
                Some(side) => {
                    inconclusive = Some(InconclusiveReason::NoNameColumns { side });
                }
                None => {
                    run = generate(&matcher, a, b);
                    if run.matches.is_empty() {
                        inconclusive = Some(InconclusiveReason::NoConfirmedMatches);
                    }
                }
            }
            if let Some(reason) = inconclusive
                && self.config.fallback_to_brute_force
            {
                info!(%reason, "key-field matching inconclusive, retrying with brute force");
                strategy = MatchStrategyKind::BruteForce;
                fell_back = true;
                inconclusive = None;
            }
        }

        if strategy == MatchStrategyKind::BruteForce {
            let matcher = BruteForceMatcher::new(self.config.brute_force_row_threshold)
                .with_scorer(self.scorer.clone());
            run = generate(&matcher, a, b);
            run.scorer_fallbacks = matcher.scorer_fallbacks();
            if run.matches.is_empty() {
                inconclusive = Some(InconclusiveReason::NoConfirmedMatches);
            }
        }

        let mappings = if run.matches.is_empty() {
            Vec::new()
        } else {
            let learn_start = Instant::now();
            let mappings = learn_mappings(&run.matches, a, b, &self.config);
            debug!(
                mappings = mappings.len(),
                duration_ms = learn_start.elapsed().as_millis(),
                "field mappings learned"
            );
            mappings
        };

        let outcome = match inconclusive {
            Some(reason) => {
                warn!(%reason, "reconciliation inconclusive");
                Outcome::Inconclusive { reason }
            }
            None => Outcome::Matched,
        };

        info!(
            strategy = strategy.as_str(),
            candidates = run.candidate_count,
            matches = run.matches.len(),
            mappings = mappings.len(),
            duration_ms = start.elapsed().as_millis(),
            "reconciliation complete"
        );

        ReconResult {
            strategy,
            outcome,
            key_fields,
            refinements,
            candidate_count: run.candidate_count,
            matches: run.matches,
            mappings,
            scorer_fallbacks: run.scorer_fallbacks,
            fell_back,
        }
    }
}

fn generate(matcher: &dyn MatchStrategy, a: &Dataset, b: &Dataset) -> StrategyRun {
    let start = Instant::now();
    let candidates = matcher.generate_candidates(a, b);
    let candidate_count = candidates.len();
    let matches = assign(candidates);
    debug!(
        strategy = matcher.kind().as_str(),
        candidates = candidate_count,
        matches = matches.len(),
        duration_ms = start.elapsed().as_millis(),
        "candidates assigned"
    );
    StrategyRun {
        candidate_count,
        matches,
        scorer_fallbacks: 0,
    }
}

/// Convenience for one-off runs with a validated configuration.
///
/// # Errors
///
/// See [`ReconEngine::new`] and [`ReconEngine::reconcile`].
pub fn reconcile(
    headers_a: Vec<String>,
    records_a: Vec<Record>,
    headers_b: Vec<String>,
    records_b: Vec<Record>,
    config: ReconConfig,
) -> Result<ReconResult> {
    ReconEngine::new(config)?.reconcile(headers_a, records_a, headers_b, records_b)
}
