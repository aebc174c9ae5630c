//! Shared data model for catalog reconciliation.
//!
//! Datasets and records go in; confirmed matches and field mappings come out.
//! Everything here is plain data: the matching logic lives in `recon-map`.

pub mod error;
pub mod mapping;
pub mod matching;
pub mod options;
pub mod record;
pub mod semantic;

pub use error::{ConfigError, ReconError, Result};
pub use mapping::{FieldMapping, QualityTier, ValuePair};
pub use matching::{ConfirmedMatch, EvidenceKind, MatchCandidate, MatchClass, MatchEvidence};
pub use options::{MatchStrategyKind, ReconConfig};
pub use record::{Dataset, HeaderSet, Record, Side};
pub use semantic::SemanticType;
