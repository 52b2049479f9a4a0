//! Domain models for the operations backend.
//!
//! # Models
//!
//! - `ingredient` - Raw materials with their current standard cost
//! - `inventory` - Append-only movement ledger and derived balances
//! - `recipe` - Bills of materials and cost breakdowns
//! - `batch` - Production batches and their frozen consumption records

pub mod batch;
pub mod ingredient;
pub mod inventory;
pub mod recipe;

pub use batch::{
    Batch, BatchConsumption, BatchDetail, BatchFilter, CostSnapshot, CreateBatchInput, NewBatch,
    NewConsumption, ProduceBatchInput,
};
pub use ingredient::{CreateIngredientInput, Ingredient, UpdateIngredientInput};
pub use inventory::{
    IngredientBalance, InventoryMovement, MovementFilter, MovementTotal, RecordMovementInput,
};
pub use recipe::{
    CreateRecipeInput, ItemCostBreakdown, Recipe, RecipeCost, RecipeDetail, RecipeItem,
    RecipeItemInput, RecipeLine, UpdateRecipeInput,
};
