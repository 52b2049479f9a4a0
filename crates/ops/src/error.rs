//! Unified error handling for operations services.

use rust_decimal::Decimal;
use thiserror::Error;

use solid_ops_core::{BatchStatus, IngredientId, RecipeId};

use crate::db::RepositoryError;

/// Error type returned by every service operation.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An outbound movement would drive the balance below zero.
    #[error(
        "Insufficient stock for ingredient {ingredient_id}: required {required}, available {available}"
    )]
    InsufficientStock {
        ingredient_id: IngredientId,
        required: Decimal,
        available: Decimal,
    },

    /// IN and ADJUST movements must carry a unit cost.
    #[error("Unit cost is required for IN and ADJUST movements")]
    MissingUnitCost,

    /// The batch is not in a status that allows the operation.
    #[error("Batch is {0}, expected PLANNED")]
    InvalidState(BatchStatus),

    /// The recipe to produce is missing or has no lines.
    #[error("Recipe {0} is missing or has no items")]
    RecipeMissingOrEmpty(RecipeId),

    /// Recipe yield must be strictly positive.
    #[error("Recipe yield must be positive, got {0}")]
    InvalidYield(Decimal),

    /// A quantity, waste factor or unit count is out of range.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Uniqueness violation (recipe name, batch code).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage failure.
    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OpsError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl OpsError {
    /// Arithmetic on `what` left the representable decimal range.
    pub(crate) fn overflow(what: &str) -> Self {
        Self::InvalidQuantity(format!("{what} is out of range"))
    }

    /// HTTP-equivalent status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::InsufficientStock { .. }
            | Self::MissingUnitCost
            | Self::InvalidState(_)
            | Self::RecipeMissingOrEmpty(_)
            | Self::InvalidYield(_)
            | Self::InvalidQuantity(_) => 400,
            Self::Repository(_) => 500,
        }
    }

    /// Whether this is an infrastructure failure rather than a rejected request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_))
    }
}
