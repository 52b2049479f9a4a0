//! Units of measure for ingredients and recipe yields.

use serde::{Deserialize, Serialize};

/// Unit an ingredient is stocked and costed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "ops.unit"))]
pub enum Unit {
    /// Grams.
    #[cfg_attr(feature = "postgres", sqlx(rename = "g"))]
    #[serde(rename = "g")]
    Gram,
    /// Milliliters.
    #[cfg_attr(feature = "postgres", sqlx(rename = "ml"))]
    #[serde(rename = "ml")]
    Milliliter,
    /// Unit count (pieces).
    #[default]
    #[cfg_attr(feature = "postgres", sqlx(rename = "un"))]
    #[serde(rename = "un")]
    Count,
}

impl Unit {
    /// Short symbol as stored in the database.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Gram => "g",
            Self::Milliliter => "ml",
            Self::Count => "un",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "g" => Ok(Self::Gram),
            "ml" => Ok(Self::Milliliter),
            "un" => Ok(Self::Count),
            _ => Err(format!("invalid unit: {s} (expected g, ml or un)")),
        }
    }
}
