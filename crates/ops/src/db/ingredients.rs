//! Database operations for ingredients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use solid_ops_core::{IngredientId, Unit};

use super::{RepositoryError, map_constraint_error};
use crate::models::{CreateIngredientInput, Ingredient, UpdateIngredientInput};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: i32,
    name: String,
    unit: Unit,
    cost_per_unit: Decimal,
    supplier_name: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: IngredientId::new(row.id),
            name: row.name,
            unit: row.unit,
            cost_per_unit: row.cost_per_unit,
            supplier_name: row.supplier_name,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Ingredient queries bound to one connection (usually a transaction).
pub struct IngredientRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> IngredientRepository<'c> {
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert a new active ingredient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &mut self,
        input: &CreateIngredientInput,
    ) -> Result<Ingredient, RepositoryError> {
        let row = sqlx::query_as::<_, IngredientRow>(
            r"
            INSERT INTO ops.ingredient (name, unit, cost_per_unit, supplier_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, unit, cost_per_unit, supplier_name, active,
                      created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(input.unit)
        .bind(input.cost_per_unit)
        .bind(&input.supplier_name)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "ingredient"))?;

        Ok(row.into())
    }

    /// Get an ingredient by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&mut self, id: IngredientId) -> Result<Option<Ingredient>, RepositoryError> {
        let row = sqlx::query_as::<_, IngredientRow>(
            r"
            SELECT id, name, unit, cost_per_unit, supplier_name, active,
                   created_at, updated_at
            FROM ops.ingredient
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List ingredients ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self, active_only: bool) -> Result<Vec<Ingredient>, RepositoryError> {
        let rows = sqlx::query_as::<_, IngredientRow>(
            r"
            SELECT id, name, unit, cost_per_unit, supplier_name, active,
                   created_at, updated_at
            FROM ops.ingredient
            WHERE ($1 = FALSE OR active)
            ORDER BY id
            ",
        )
        .bind(active_only)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply a partial update. Unset fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &mut self,
        id: IngredientId,
        input: &UpdateIngredientInput,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        let row = sqlx::query_as::<_, IngredientRow>(
            r"
            UPDATE ops.ingredient
            SET name = COALESCE($2, name),
                unit = COALESCE($3, unit),
                cost_per_unit = COALESCE($4, cost_per_unit),
                supplier_name = COALESCE($5, supplier_name),
                active = COALESCE($6, active),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, unit, cost_per_unit, supplier_name, active,
                      created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(&input.name)
        .bind(input.unit)
        .bind(input.cost_per_unit)
        .bind(&input.supplier_name)
        .bind(input.active)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "ingredient"))?;

        Ok(row.map(Into::into))
    }
}
