//! Recipe (bill of materials) domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solid_ops_core::{IngredientId, RecipeId, RecipeItemId, Unit};

/// A recipe producing `yield_quantity` units per run of its item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe ID.
    pub id: RecipeId,
    /// Unique recipe name.
    pub name: String,
    /// Output of one run of the item list. Always positive.
    pub yield_quantity: Decimal,
    /// Unit of the yield.
    pub yield_unit: Unit,
    /// Optional notes.
    pub notes: Option<String>,
    /// When the recipe was created.
    pub created_at: DateTime<Utc>,
    /// When the recipe was last updated.
    pub updated_at: DateTime<Utc>,
}

/// One ingredient line of a recipe. Unique per (recipe, ingredient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub id: RecipeItemId,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    /// Net quantity per recipe yield.
    pub quantity: Decimal,
    /// Fractional overage consumed during production (0.05 = 5%).
    pub waste_factor: Decimal,
}

/// A recipe item joined with its ingredient's current data.
///
/// Lines are returned in item insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeLine {
    pub item_id: RecipeItemId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub unit: Unit,
    /// The ingredient's current `cost_per_unit`.
    pub cost_per_unit: Decimal,
    pub quantity: Decimal,
    pub waste_factor: Decimal,
}

/// A recipe with its items loaded.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub items: Vec<RecipeItem>,
}

/// Input for adding (or overwriting) a recipe line.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeItemInput {
    pub ingredient_id: IngredientId,
    pub quantity: Decimal,
    #[serde(default)]
    pub waste_factor: Decimal,
}

/// Input for creating a recipe together with its items.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipeInput {
    pub name: String,
    pub yield_quantity: Decimal,
    pub yield_unit: Unit,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<RecipeItemInput>,
}

/// Partial update for a recipe header. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecipeInput {
    pub name: Option<String>,
    pub yield_quantity: Option<Decimal>,
    pub yield_unit: Option<Unit>,
    pub notes: Option<String>,
}

/// Cost of one recipe line at current ingredient cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCostBreakdown {
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub unit_cost: Decimal,
    /// `quantity * unit_cost`; the waste factor is not applied.
    pub line_cost: Decimal,
}

/// Cost sheet for a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeCost {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    pub total_cost: Decimal,
    pub cost_per_unit: Decimal,
    pub yield_quantity: Decimal,
    pub breakdown: Vec<ItemCostBreakdown>,
}
