//! `PostgreSQL` backend: one transaction per session.

use sqlx::{PgPool, Postgres, Transaction};

use solid_ops_core::{BatchId, BatchStatus, IngredientId, RecipeId, UserId};

use super::batches::BatchRepository;
use super::ingredients::IngredientRepository;
use super::movements::MovementRepository;
use super::recipes::RecipeRepository;
use super::{RepositoryError, Session, Store};
use crate::models::{
    Batch, BatchConsumption, BatchFilter, CostSnapshot, CreateIngredientInput, CreateRecipeInput,
    Ingredient, InventoryMovement, MovementFilter, MovementTotal, NewBatch, NewConsumption, Recipe,
    RecipeItem, RecipeItemInput, RecipeLine, RecordMovementInput, UpdateIngredientInput,
    UpdateRecipeInput,
};

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (for migrations).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx })
    }
}

/// A session holding an open transaction. Dropping it rolls back.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl Session for PgSession {
    async fn insert_ingredient(
        &mut self,
        input: &CreateIngredientInput,
    ) -> Result<Ingredient, RepositoryError> {
        IngredientRepository::new(&mut self.tx).insert(input).await
    }

    async fn get_ingredient(
        &mut self,
        id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        IngredientRepository::new(&mut self.tx).get(id).await
    }

    async fn list_ingredients(
        &mut self,
        active_only: bool,
    ) -> Result<Vec<Ingredient>, RepositoryError> {
        IngredientRepository::new(&mut self.tx).list(active_only).await
    }

    async fn update_ingredient(
        &mut self,
        id: IngredientId,
        input: &UpdateIngredientInput,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        IngredientRepository::new(&mut self.tx).update(id, input).await
    }

    async fn movement_totals(
        &mut self,
        ingredient_id: IngredientId,
    ) -> Result<Vec<MovementTotal>, RepositoryError> {
        MovementRepository::new(&mut self.tx).totals(ingredient_id).await
    }

    async fn insert_movement(
        &mut self,
        input: &RecordMovementInput,
        created_by: UserId,
    ) -> Result<InventoryMovement, RepositoryError> {
        MovementRepository::new(&mut self.tx)
            .insert(input, created_by)
            .await
    }

    async fn list_movements(
        &mut self,
        filter: &MovementFilter,
    ) -> Result<Vec<InventoryMovement>, RepositoryError> {
        MovementRepository::new(&mut self.tx).list(filter).await
    }

    async fn insert_recipe(&mut self, input: &CreateRecipeInput) -> Result<Recipe, RepositoryError> {
        RecipeRepository::new(&mut self.tx).insert(input).await
    }

    async fn get_recipe(&mut self, id: RecipeId) -> Result<Option<Recipe>, RepositoryError> {
        RecipeRepository::new(&mut self.tx).get(id).await
    }

    async fn find_recipe_by_name(&mut self, name: &str) -> Result<Option<Recipe>, RepositoryError> {
        RecipeRepository::new(&mut self.tx).find_by_name(name).await
    }

    async fn list_recipes(&mut self, limit: i64, offset: i64) -> Result<Vec<Recipe>, RepositoryError> {
        RecipeRepository::new(&mut self.tx).list(limit, offset).await
    }

    async fn update_recipe(
        &mut self,
        id: RecipeId,
        input: &UpdateRecipeInput,
    ) -> Result<Option<Recipe>, RepositoryError> {
        RecipeRepository::new(&mut self.tx).update(id, input).await
    }

    async fn upsert_recipe_item(
        &mut self,
        recipe_id: RecipeId,
        input: &RecipeItemInput,
    ) -> Result<RecipeItem, RepositoryError> {
        RecipeRepository::new(&mut self.tx)
            .upsert_item(recipe_id, input)
            .await
    }

    async fn delete_recipe_item(
        &mut self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> Result<bool, RepositoryError> {
        RecipeRepository::new(&mut self.tx)
            .delete_item(recipe_id, ingredient_id)
            .await
    }

    async fn list_recipe_items(
        &mut self,
        recipe_id: RecipeId,
    ) -> Result<Vec<RecipeItem>, RepositoryError> {
        RecipeRepository::new(&mut self.tx).list_items(recipe_id).await
    }

    async fn recipe_lines(&mut self, recipe_id: RecipeId) -> Result<Vec<RecipeLine>, RepositoryError> {
        RecipeRepository::new(&mut self.tx).lines(recipe_id).await
    }

    async fn batch_code_exists(&mut self, code: &str) -> Result<bool, RepositoryError> {
        BatchRepository::new(&mut self.tx).code_exists(code).await
    }

    async fn insert_batch(&mut self, batch: &NewBatch) -> Result<Batch, RepositoryError> {
        BatchRepository::new(&mut self.tx).insert(batch).await
    }

    async fn get_batch(&mut self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        BatchRepository::new(&mut self.tx).get(id).await
    }

    async fn list_batches(&mut self, filter: &BatchFilter) -> Result<Vec<Batch>, RepositoryError> {
        BatchRepository::new(&mut self.tx).list(filter).await
    }

    async fn set_batch_status(
        &mut self,
        id: BatchId,
        status: BatchStatus,
    ) -> Result<Option<Batch>, RepositoryError> {
        BatchRepository::new(&mut self.tx).set_status(id, status).await
    }

    async fn mark_batch_produced(
        &mut self,
        id: BatchId,
        snapshot: &CostSnapshot,
    ) -> Result<Option<Batch>, RepositoryError> {
        BatchRepository::new(&mut self.tx)
            .mark_produced(id, snapshot)
            .await
    }

    async fn insert_consumption(
        &mut self,
        batch_id: BatchId,
        consumption: &NewConsumption,
    ) -> Result<BatchConsumption, RepositoryError> {
        BatchRepository::new(&mut self.tx)
            .insert_consumption(batch_id, consumption)
            .await
    }

    async fn list_consumptions(
        &mut self,
        batch_id: BatchId,
    ) -> Result<Vec<BatchConsumption>, RepositoryError> {
        BatchRepository::new(&mut self.tx)
            .list_consumptions(batch_id)
            .await
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
