//! Status enums for ledger and production entities.

use serde::{Deserialize, Serialize};

/// Kind of inventory movement recorded in the ledger.
///
/// `In` and `Out` quantities are stored as non-negative magnitudes; `Adjust`
/// quantities are signed by the caller (negative for a downward correction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "ops.movement_type", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Stock received.
    In,
    /// Stock consumed or shipped.
    Out,
    /// Signed correction.
    Adjust,
}

impl MovementType {
    /// Whether this movement type must carry a unit cost.
    #[must_use]
    pub const fn requires_unit_cost(self) -> bool {
        matches!(self, Self::In | Self::Adjust)
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Adjust => write!(f, "ADJUST"),
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            "ADJUST" => Ok(Self::Adjust),
            _ => Err(format!("invalid movement type: {s}")),
        }
    }
}

/// Production batch lifecycle.
///
/// `Planned` is the only non-terminal state:
///
/// ```text
/// PLANNED --produce--> PRODUCED
/// PLANNED --cancel---> CANCELED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "ops.batch_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchStatus {
    #[default]
    Planned,
    Produced,
    Canceled,
}

impl BatchStatus {
    /// Whether no further transition is allowed from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Planned)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planned => write!(f, "PLANNED"),
            Self::Produced => write!(f, "PRODUCED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PLANNED" => Ok(Self::Planned),
            "PRODUCED" => Ok(Self::Produced),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(format!("invalid batch status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cost_requirement() {
        assert!(MovementType::In.requires_unit_cost());
        assert!(MovementType::Adjust.requires_unit_cost());
        assert!(!MovementType::Out.requires_unit_cost());
    }

    #[test]
    fn test_movement_type_parse_is_case_insensitive() {
        assert_eq!("in".parse::<MovementType>().unwrap(), MovementType::In);
        assert_eq!("Adjust".parse::<MovementType>().unwrap(), MovementType::Adjust);
        assert!("transfer".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_movement_type_serde_uppercase() {
        assert_eq!(serde_json::to_string(&MovementType::Out).unwrap(), "\"OUT\"");
        let parsed: MovementType = serde_json::from_str("\"ADJUST\"").unwrap();
        assert_eq!(parsed, MovementType::Adjust);
    }

    #[test]
    fn test_batch_status_terminal_states() {
        assert!(!BatchStatus::Planned.is_terminal());
        assert!(BatchStatus::Produced.is_terminal());
        assert!(BatchStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_batch_status_default_is_planned() {
        assert_eq!(BatchStatus::default(), BatchStatus::Planned);
    }

    #[test]
    fn test_batch_status_display_roundtrip() {
        for status in [BatchStatus::Planned, BatchStatus::Produced, BatchStatus::Canceled] {
            assert_eq!(status.to_string().parse::<BatchStatus>().unwrap(), status);
        }
    }
}
