//! Semantic field types assigned to columns by the classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Meaning of a column, inferred from its name and optionally its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Name,
    Identifier,
    Date,
    Price,
    Rarity,
    Series,
    Unknown,
}

impl SemanticType {
    /// Every classifiable type, in classification order. `Unknown` is excluded.
    pub const CLASSIFIABLE: [SemanticType; 6] = [
        Self::Name,
        Self::Identifier,
        Self::Date,
        Self::Price,
        Self::Rarity,
        Self::Series,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Identifier => "identifier",
            Self::Date => "date",
            Self::Price => "price",
            Self::Rarity => "rarity",
            Self::Series => "series",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
