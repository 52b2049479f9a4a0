//! Persistence layer for the operations backend.
//!
//! # Unit of work
//!
//! Every service call runs inside one [`Session`] obtained from a [`Store`].
//! Writes become visible only when [`Session::commit`] succeeds; dropping a
//! session without committing rolls everything back.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` (schema `ops`), one transaction per session
//! - [`MemoryStore`] - in-process tables for tests and local experiments
//!
//! # Tables (schema `ops`)
//!
//! - `ingredient` - Raw materials and their current standard cost
//! - `inventory_movement` - Append-only stock ledger
//! - `recipe` / `recipe_item` - Bills of materials
//! - `batch` / `batch_consumption` - Production runs and what they consumed
//!
//! # Migrations
//!
//! Migrations are stored in `crates/ops/migrations/` and run via:
//! ```bash
//! cargo run -p solid-ops-cli -- migrate
//! ```

pub mod batches;
pub mod ingredients;
pub mod memory;
pub mod movements;
pub mod postgres;
pub mod recipes;

use std::future::Future;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use secrecy::ExposeSecret;
use solid_ops_core::{BatchId, BatchStatus, IngredientId, RecipeId, UserId};

use crate::config::DatabaseConfig;
use crate::models::{
    Batch, BatchConsumption, BatchFilter, CostSnapshot, CreateIngredientInput, CreateRecipeInput,
    Ingredient, InventoryMovement, MovementFilter, MovementTotal, NewBatch, NewConsumption, Recipe,
    RecipeItem, RecipeItemInput, RecipeLine, RecordMovementInput, UpdateIngredientInput,
    UpdateRecipeInput,
};

pub use memory::MemoryStore;
pub use postgres::{PgSession, PgStore};

/// Default page size for list queries.
pub const DEFAULT_LIMIT: i64 = 100;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation (e.g., unique recipe name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to `Conflict`, keep everything else.
pub(crate) fn map_constraint_error(e: sqlx::Error, what: &str) -> RepositoryError {
    match e {
        sqlx::Error::Database(ref db_err)
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
        {
            let constraint = db_err.constraint().unwrap_or("unknown");
            RepositoryError::Conflict(format!("{what} ({constraint})"))
        }
        other => RepositoryError::Database(other),
    }
}

/// Create a `PostgreSQL` connection pool from configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(config.url.expose_secret())
        .await
}

/// Source of units of work.
pub trait Store: Send + Sync {
    /// Session type handed out by this store.
    type Session: Session;

    /// Open a new unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Session, RepositoryError>> + Send;
}

/// One unit of work over the operations schema.
///
/// Reads observe the session's own uncommitted writes. Nothing is visible to
/// other sessions until [`Session::commit`] returns `Ok`.
pub trait Session: Send {
    // =========================================================================
    // Ingredients
    // =========================================================================

    /// Insert an active ingredient.
    fn insert_ingredient(
        &mut self,
        input: &CreateIngredientInput,
    ) -> impl Future<Output = Result<Ingredient, RepositoryError>> + Send;

    /// Fetch an ingredient regardless of its `active` flag.
    fn get_ingredient(
        &mut self,
        id: IngredientId,
    ) -> impl Future<Output = Result<Option<Ingredient>, RepositoryError>> + Send;

    /// List ingredients ordered by ID.
    fn list_ingredients(
        &mut self,
        active_only: bool,
    ) -> impl Future<Output = Result<Vec<Ingredient>, RepositoryError>> + Send;

    /// Apply a partial update. Returns `None` if the ingredient doesn't exist.
    fn update_ingredient(
        &mut self,
        id: IngredientId,
        input: &UpdateIngredientInput,
    ) -> impl Future<Output = Result<Option<Ingredient>, RepositoryError>> + Send;

    // =========================================================================
    // Movement ledger
    // =========================================================================

    /// Sum of movement quantities per type for one ingredient.
    ///
    /// Types with no movements are omitted.
    fn movement_totals(
        &mut self,
        ingredient_id: IngredientId,
    ) -> impl Future<Output = Result<Vec<MovementTotal>, RepositoryError>> + Send;

    /// Append a movement to the ledger.
    fn insert_movement(
        &mut self,
        input: &RecordMovementInput,
        created_by: UserId,
    ) -> impl Future<Output = Result<InventoryMovement, RepositoryError>> + Send;

    /// List movements, newest first.
    fn list_movements(
        &mut self,
        filter: &MovementFilter,
    ) -> impl Future<Output = Result<Vec<InventoryMovement>, RepositoryError>> + Send;

    // =========================================================================
    // Recipes
    // =========================================================================

    /// Insert a recipe header (items are added separately).
    fn insert_recipe(
        &mut self,
        input: &CreateRecipeInput,
    ) -> impl Future<Output = Result<Recipe, RepositoryError>> + Send;

    fn get_recipe(
        &mut self,
        id: RecipeId,
    ) -> impl Future<Output = Result<Option<Recipe>, RepositoryError>> + Send;

    fn find_recipe_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Recipe>, RepositoryError>> + Send;

    /// List recipes ordered by ID.
    fn list_recipes(
        &mut self,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<Recipe>, RepositoryError>> + Send;

    /// Apply a partial update. Returns `None` if the recipe doesn't exist.
    fn update_recipe(
        &mut self,
        id: RecipeId,
        input: &UpdateRecipeInput,
    ) -> impl Future<Output = Result<Option<Recipe>, RepositoryError>> + Send;

    /// Insert a line, or overwrite quantity and waste factor of an existing
    /// (recipe, ingredient) pair. An overwritten line keeps its position.
    fn upsert_recipe_item(
        &mut self,
        recipe_id: RecipeId,
        input: &RecipeItemInput,
    ) -> impl Future<Output = Result<RecipeItem, RepositoryError>> + Send;

    /// Remove a line. Returns `false` if the pair didn't exist.
    fn delete_recipe_item(
        &mut self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Recipe lines in insertion order.
    fn list_recipe_items(
        &mut self,
        recipe_id: RecipeId,
    ) -> impl Future<Output = Result<Vec<RecipeItem>, RepositoryError>> + Send;

    /// Recipe lines joined with each ingredient's name, unit and current cost.
    fn recipe_lines(
        &mut self,
        recipe_id: RecipeId,
    ) -> impl Future<Output = Result<Vec<RecipeLine>, RepositoryError>> + Send;

    // =========================================================================
    // Batches
    // =========================================================================

    fn batch_code_exists(
        &mut self,
        code: &str,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Insert a `PLANNED` batch with empty snapshot fields.
    fn insert_batch(
        &mut self,
        batch: &NewBatch,
    ) -> impl Future<Output = Result<Batch, RepositoryError>> + Send;

    fn get_batch(
        &mut self,
        id: BatchId,
    ) -> impl Future<Output = Result<Option<Batch>, RepositoryError>> + Send;

    /// List batches, newest first.
    fn list_batches(
        &mut self,
        filter: &BatchFilter,
    ) -> impl Future<Output = Result<Vec<Batch>, RepositoryError>> + Send;

    /// Set the status only. Returns `None` if the batch doesn't exist.
    fn set_batch_status(
        &mut self,
        id: BatchId,
        status: BatchStatus,
    ) -> impl Future<Output = Result<Option<Batch>, RepositoryError>> + Send;

    /// Mark a batch `PRODUCED` and write its actual units and cost snapshot.
    fn mark_batch_produced(
        &mut self,
        id: BatchId,
        snapshot: &CostSnapshot,
    ) -> impl Future<Output = Result<Option<Batch>, RepositoryError>> + Send;

    fn insert_consumption(
        &mut self,
        batch_id: BatchId,
        consumption: &NewConsumption,
    ) -> impl Future<Output = Result<BatchConsumption, RepositoryError>> + Send;

    /// Consumptions of a batch in insertion order.
    fn list_consumptions(
        &mut self,
        batch_id: BatchId,
    ) -> impl Future<Output = Result<Vec<BatchConsumption>, RepositoryError>> + Send;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Make every write of this session durable and visible.
    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send
    where
        Self: Sized;
}
