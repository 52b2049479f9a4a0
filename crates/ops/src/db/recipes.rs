//! Database operations for recipes and their lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use solid_ops_core::{IngredientId, RecipeId, RecipeItemId, Unit};

use super::{RepositoryError, map_constraint_error};
use crate::models::{
    CreateRecipeInput, Recipe, RecipeItem, RecipeItemInput, RecipeLine, UpdateRecipeInput,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: i32,
    name: String,
    yield_quantity: Decimal,
    yield_unit: Unit,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: RecipeId::new(row.id),
            name: row.name,
            yield_quantity: row.yield_quantity,
            yield_unit: row.yield_unit,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeItemRow {
    id: i32,
    recipe_id: i32,
    ingredient_id: i32,
    quantity: Decimal,
    waste_factor: Decimal,
}

impl From<RecipeItemRow> for RecipeItem {
    fn from(row: RecipeItemRow) -> Self {
        Self {
            id: RecipeItemId::new(row.id),
            recipe_id: RecipeId::new(row.recipe_id),
            ingredient_id: IngredientId::new(row.ingredient_id),
            quantity: row.quantity,
            waste_factor: row.waste_factor,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeLineRow {
    item_id: i32,
    ingredient_id: i32,
    ingredient_name: String,
    unit: Unit,
    cost_per_unit: Decimal,
    quantity: Decimal,
    waste_factor: Decimal,
}

impl From<RecipeLineRow> for RecipeLine {
    fn from(row: RecipeLineRow) -> Self {
        Self {
            item_id: RecipeItemId::new(row.item_id),
            ingredient_id: IngredientId::new(row.ingredient_id),
            ingredient_name: row.ingredient_name,
            unit: row.unit,
            cost_per_unit: row.cost_per_unit,
            quantity: row.quantity,
            waste_factor: row.waste_factor,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Recipe queries bound to one connection.
pub struct RecipeRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RecipeRepository<'c> {
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    // =========================================================================
    // Recipe headers
    // =========================================================================

    /// Insert a recipe header.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&mut self, input: &CreateRecipeInput) -> Result<Recipe, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r"
            INSERT INTO ops.recipe (name, yield_quantity, yield_unit, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, yield_quantity, yield_unit, notes, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(input.yield_quantity)
        .bind(input.yield_unit)
        .bind(&input.notes)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "recipe name already exists"))?;

        Ok(row.into())
    }

    /// Get a recipe by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&mut self, id: RecipeId) -> Result<Option<Recipe>, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r"
            SELECT id, name, yield_quantity, yield_unit, notes, created_at, updated_at
            FROM ops.recipe
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a recipe by its unique name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(&mut self, name: &str) -> Result<Option<Recipe>, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r"
            SELECT id, name, yield_quantity, yield_unit, notes, created_at, updated_at
            FROM ops.recipe
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List recipes ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self, limit: i64, offset: i64) -> Result<Vec<Recipe>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r"
            SELECT id, name, yield_quantity, yield_unit, notes, created_at, updated_at
            FROM ops.recipe
            ORDER BY id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply a partial update to a recipe header.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new name is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &mut self,
        id: RecipeId,
        input: &UpdateRecipeInput,
    ) -> Result<Option<Recipe>, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r"
            UPDATE ops.recipe
            SET name = COALESCE($2, name),
                yield_quantity = COALESCE($3, yield_quantity),
                yield_unit = COALESCE($4, yield_unit),
                notes = COALESCE($5, notes),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, yield_quantity, yield_unit, notes, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(&input.name)
        .bind(input.yield_quantity)
        .bind(input.yield_unit)
        .bind(&input.notes)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "recipe name already exists"))?;

        Ok(row.map(Into::into))
    }

    // =========================================================================
    // Recipe lines
    // =========================================================================

    /// Insert a line or overwrite the existing (recipe, ingredient) pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the recipe or ingredient doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert_item(
        &mut self,
        recipe_id: RecipeId,
        input: &RecipeItemInput,
    ) -> Result<RecipeItem, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeItemRow>(
            r"
            INSERT INTO ops.recipe_item (recipe_id, ingredient_id, quantity, waste_factor)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (recipe_id, ingredient_id)
            DO UPDATE SET quantity = EXCLUDED.quantity,
                          waste_factor = EXCLUDED.waste_factor
            RETURNING id, recipe_id, ingredient_id, quantity, waste_factor
            ",
        )
        .bind(recipe_id.as_i32())
        .bind(input.ingredient_id.as_i32())
        .bind(input.quantity)
        .bind(input.waste_factor)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "recipe item"))?;

        Ok(row.into())
    }

    /// Delete one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_item(
        &mut self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM ops.recipe_item
            WHERE recipe_id = $1 AND ingredient_id = $2
            ",
        )
        .bind(recipe_id.as_i32())
        .bind(ingredient_id.as_i32())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lines of a recipe in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(
        &mut self,
        recipe_id: RecipeId,
    ) -> Result<Vec<RecipeItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeItemRow>(
            r"
            SELECT id, recipe_id, ingredient_id, quantity, waste_factor
            FROM ops.recipe_item
            WHERE recipe_id = $1
            ORDER BY id
            ",
        )
        .bind(recipe_id.as_i32())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Lines joined with their ingredient, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&mut self, recipe_id: RecipeId) -> Result<Vec<RecipeLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeLineRow>(
            r"
            SELECT ri.id AS item_id,
                   ri.ingredient_id,
                   i.name AS ingredient_name,
                   i.unit,
                   i.cost_per_unit,
                   ri.quantity,
                   ri.waste_factor
            FROM ops.recipe_item ri
            JOIN ops.ingredient i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = $1
            ORDER BY ri.id
            ",
        )
        .bind(recipe_id.as_i32())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
