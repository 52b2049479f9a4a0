//! Database operations for production batches and their consumptions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use solid_ops_core::{BatchConsumptionId, BatchId, BatchStatus, IngredientId, RecipeId, UserId};

use super::{DEFAULT_LIMIT, RepositoryError, map_constraint_error};
use crate::models::{
    Batch, BatchConsumption, BatchFilter, CostSnapshot, NewBatch, NewConsumption,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: i32,
    code: String,
    recipe_id: i32,
    status: BatchStatus,
    planned_units: Decimal,
    actual_units: Option<Decimal>,
    cost_snapshot_total: Option<Decimal>,
    cost_snapshot_per_unit: Option<Decimal>,
    created_by: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Self {
            id: BatchId::new(row.id),
            code: row.code,
            recipe_id: RecipeId::new(row.recipe_id),
            status: row.status,
            planned_units: row.planned_units,
            actual_units: row.actual_units,
            cost_snapshot_total: row.cost_snapshot_total,
            cost_snapshot_per_unit: row.cost_snapshot_per_unit,
            created_by: UserId::new(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConsumptionRow {
    id: i32,
    batch_id: i32,
    ingredient_id: i32,
    quantity_used: Decimal,
    unit_cost_at_time: Decimal,
}

impl From<ConsumptionRow> for BatchConsumption {
    fn from(row: ConsumptionRow) -> Self {
        Self {
            id: BatchConsumptionId::new(row.id),
            batch_id: BatchId::new(row.batch_id),
            ingredient_id: IngredientId::new(row.ingredient_id),
            quantity_used: row.quantity_used,
            unit_cost_at_time: row.unit_cost_at_time,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Batch queries bound to one connection.
pub struct BatchRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> BatchRepository<'c> {
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    // =========================================================================
    // Batch CRUD
    // =========================================================================

    /// Check whether a batch code is already in use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn code_exists(&mut self, code: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ops.batch WHERE code = $1)")
                .bind(code)
                .fetch_one(&mut *self.conn)
                .await?;

        Ok(exists)
    }

    /// Insert a planned batch.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken or the recipe is missing.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&mut self, batch: &NewBatch) -> Result<Batch, RepositoryError> {
        let row = sqlx::query_as::<_, BatchRow>(
            r"
            INSERT INTO ops.batch (code, recipe_id, status, planned_units, created_by)
            VALUES ($1, $2, 'PLANNED', $3, $4)
            RETURNING id, code, recipe_id, status, planned_units, actual_units,
                      cost_snapshot_total, cost_snapshot_per_unit,
                      created_by, created_at, updated_at
            ",
        )
        .bind(&batch.code)
        .bind(batch.recipe_id.as_i32())
        .bind(batch.planned_units)
        .bind(batch.created_by.as_i32())
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "batch"))?;

        Ok(row.into())
    }

    /// Get a batch by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&mut self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        let row = sqlx::query_as::<_, BatchRow>(
            r"
            SELECT id, code, recipe_id, status, planned_units, actual_units,
                   cost_snapshot_total, cost_snapshot_per_unit,
                   created_by, created_at, updated_at
            FROM ops.batch
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List batches, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self, filter: &BatchFilter) -> Result<Vec<Batch>, RepositoryError> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r"
            SELECT id, code, recipe_id, status, planned_units, actual_units,
                   cost_snapshot_total, cost_snapshot_per_unit,
                   created_by, created_at, updated_at
            FROM ops.batch
            WHERE ($1::ops.batch_status IS NULL OR status = $1)
              AND ($2::int IS NULL OR recipe_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(filter.status)
        .bind(filter.recipe_id.map(|id| id.as_i32()))
        .bind(filter.limit.unwrap_or(DEFAULT_LIMIT))
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Change the status of a batch.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(
        &mut self,
        id: BatchId,
        status: BatchStatus,
    ) -> Result<Option<Batch>, RepositoryError> {
        let row = sqlx::query_as::<_, BatchRow>(
            r"
            UPDATE ops.batch
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, code, recipe_id, status, planned_units, actual_units,
                      cost_snapshot_total, cost_snapshot_per_unit,
                      created_by, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(status)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Mark a batch produced and freeze its cost snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_produced(
        &mut self,
        id: BatchId,
        snapshot: &CostSnapshot,
    ) -> Result<Option<Batch>, RepositoryError> {
        let row = sqlx::query_as::<_, BatchRow>(
            r"
            UPDATE ops.batch
            SET status = 'PRODUCED',
                actual_units = $2,
                cost_snapshot_total = $3,
                cost_snapshot_per_unit = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING id, code, recipe_id, status, planned_units, actual_units,
                      cost_snapshot_total, cost_snapshot_per_unit,
                      created_by, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(snapshot.actual_units)
        .bind(snapshot.total)
        .bind(snapshot.per_unit)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    // =========================================================================
    // Consumptions
    // =========================================================================

    /// Record what a batch consumed of one ingredient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ingredient was already recorded for this batch.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert_consumption(
        &mut self,
        batch_id: BatchId,
        consumption: &NewConsumption,
    ) -> Result<BatchConsumption, RepositoryError> {
        let row = sqlx::query_as::<_, ConsumptionRow>(
            r"
            INSERT INTO ops.batch_consumption (
                batch_id, ingredient_id, quantity_used, unit_cost_at_time
            )
            VALUES ($1, $2, $3, $4)
            RETURNING id, batch_id, ingredient_id, quantity_used, unit_cost_at_time
            ",
        )
        .bind(batch_id.as_i32())
        .bind(consumption.ingredient_id.as_i32())
        .bind(consumption.quantity_used)
        .bind(consumption.unit_cost_at_time)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "batch consumption"))?;

        Ok(row.into())
    }

    /// Consumptions of a batch in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_consumptions(
        &mut self,
        batch_id: BatchId,
    ) -> Result<Vec<BatchConsumption>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(
            r"
            SELECT id, batch_id, ingredient_id, quantity_used, unit_cost_at_time
            FROM ops.batch_consumption
            WHERE batch_id = $1
            ORDER BY id
            ",
        )
        .bind(batch_id.as_i32())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
