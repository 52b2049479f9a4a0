//! Production batch domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solid_ops_core::{BatchConsumptionId, BatchId, BatchStatus, IngredientId, RecipeId, UserId};

/// One production run of a recipe.
///
/// `actual_units` and both cost snapshot fields are set exactly once, when the
/// batch is produced, and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch ID.
    pub id: BatchId,
    /// Batch code (`SOL-<unix timestamp>`).
    pub code: String,
    /// Recipe this batch produces.
    pub recipe_id: RecipeId,
    /// Lifecycle status.
    pub status: BatchStatus,
    /// Units planned at creation.
    pub planned_units: Decimal,
    /// Units actually produced.
    pub actual_units: Option<Decimal>,
    /// Total cost frozen at production time.
    pub cost_snapshot_total: Option<Decimal>,
    /// Cost per produced unit frozen at production time.
    pub cost_snapshot_per_unit: Option<Decimal>,
    /// Actor who planned the batch.
    pub created_by: UserId,
    /// When the batch was created.
    pub created_at: DateTime<Utc>,
    /// When the batch was last updated.
    pub updated_at: DateTime<Utc>,
}

/// What a produced batch actually deducted for one ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConsumption {
    pub id: BatchConsumptionId,
    pub batch_id: BatchId,
    pub ingredient_id: IngredientId,
    pub quantity_used: Decimal,
    pub unit_cost_at_time: Decimal,
}

/// A batch with its consumption records loaded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchDetail {
    #[serde(flatten)]
    pub batch: Batch,
    pub consumptions: Vec<BatchConsumption>,
}

/// Input for planning a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatchInput {
    pub recipe_id: RecipeId,
    pub planned_units: Decimal,
}

/// Input for producing a planned batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProduceBatchInput {
    /// Units actually produced; defaults to the planned units.
    pub actual_units: Option<Decimal>,
}

/// Row-level insert for a new batch.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub code: String,
    pub recipe_id: RecipeId,
    pub planned_units: Decimal,
    pub created_by: UserId,
}

/// Row-level insert for a consumption record.
#[derive(Debug, Clone, Copy)]
pub struct NewConsumption {
    pub ingredient_id: IngredientId,
    pub quantity_used: Decimal,
    pub unit_cost_at_time: Decimal,
}

/// Values written to a batch when it is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSnapshot {
    pub actual_units: Decimal,
    pub total: Decimal,
    pub per_unit: Decimal,
}

/// Filter criteria for listing batches.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    /// Filter by status.
    pub status: Option<BatchStatus>,
    /// Filter by recipe.
    pub recipe_id: Option<RecipeId>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}
