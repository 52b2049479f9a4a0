//! Ingredient (raw material) domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solid_ops_core::{IngredientId, Unit};

/// A raw material tracked in the inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique ingredient ID.
    pub id: IngredientId,
    /// Display name.
    pub name: String,
    /// Unit the ingredient is stocked and costed in.
    pub unit: Unit,
    /// Current standard cost per unit.
    pub cost_per_unit: Decimal,
    /// Optional supplier name.
    pub supplier_name: Option<String>,
    /// Soft-delete flag; inactive ingredients are hidden from listings.
    pub active: bool,
    /// When the ingredient was created.
    pub created_at: DateTime<Utc>,
    /// When the ingredient was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an ingredient.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIngredientInput {
    /// Display name.
    pub name: String,
    /// Stock unit.
    pub unit: Unit,
    /// Standard cost per unit.
    #[serde(default)]
    pub cost_per_unit: Decimal,
    /// Optional supplier name.
    pub supplier_name: Option<String>,
}

/// Partial update for an ingredient. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIngredientInput {
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub cost_per_unit: Option<Decimal>,
    pub supplier_name: Option<String>,
    pub active: Option<bool>,
}
