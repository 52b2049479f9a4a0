//! Inventory ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solid_ops_core::{IngredientId, MovementId, MovementType, Unit, UserId};

/// One immutable entry in the inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryMovement {
    /// Unique movement ID.
    pub id: MovementId,
    /// Ingredient whose stock this movement changes.
    pub ingredient_id: IngredientId,
    /// Movement kind.
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Magnitude for IN/OUT, signed for ADJUST.
    pub quantity: Decimal,
    /// Unit cost at the time of the movement (always set for IN/ADJUST).
    pub unit_cost_at_time: Option<Decimal>,
    /// Free-form note (production movements reference the batch code).
    pub note: Option<String>,
    /// Actor who recorded the movement.
    pub created_by: UserId,
    /// When the movement was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a movement.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovementInput {
    pub ingredient_id: IngredientId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_cost_at_time: Option<Decimal>,
    pub note: Option<String>,
}

/// Sum of ledger quantities for one movement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementTotal {
    pub movement_type: MovementType,
    pub total: Decimal,
}

/// Current stock of an ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientBalance {
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub unit: Unit,
    pub balance: Decimal,
}

/// Filter criteria for listing movements.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// Only movements for this ingredient.
    pub ingredient_id: Option<IngredientId>,
    /// Recorded at or after this instant.
    pub start: Option<DateTime<Utc>>,
    /// Recorded at or before this instant.
    pub end: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}
