//! Database operations for the inventory movement ledger.
//!
//! The ledger is append-only: there is no update or delete here, and the
//! schema rejects both with a trigger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use solid_ops_core::{IngredientId, MovementId, MovementType, UserId};

use super::{DEFAULT_LIMIT, RepositoryError, map_constraint_error};
use crate::models::{InventoryMovement, MovementFilter, MovementTotal, RecordMovementInput};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: i32,
    ingredient_id: i32,
    movement_type: MovementType,
    quantity: Decimal,
    unit_cost_at_time: Option<Decimal>,
    note: Option<String>,
    created_by: i32,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for InventoryMovement {
    fn from(row: MovementRow) -> Self {
        Self {
            id: MovementId::new(row.id),
            ingredient_id: IngredientId::new(row.ingredient_id),
            movement_type: row.movement_type,
            quantity: row.quantity,
            unit_cost_at_time: row.unit_cost_at_time,
            note: row.note,
            created_by: UserId::new(row.created_by),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TotalRow {
    movement_type: MovementType,
    total: Decimal,
}

// =============================================================================
// Repository
// =============================================================================

/// Ledger queries bound to one connection.
pub struct MovementRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> MovementRepository<'c> {
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Per-type quantity sums for one ingredient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(
        &mut self,
        ingredient_id: IngredientId,
    ) -> Result<Vec<MovementTotal>, RepositoryError> {
        let rows = sqlx::query_as::<_, TotalRow>(
            r"
            SELECT movement_type, SUM(quantity) AS total
            FROM ops.inventory_movement
            WHERE ingredient_id = $1
            GROUP BY movement_type
            ",
        )
        .bind(ingredient_id.as_i32())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MovementTotal {
                movement_type: row.movement_type,
                total: row.total,
            })
            .collect())
    }

    /// Append one movement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ingredient doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &mut self,
        input: &RecordMovementInput,
        created_by: UserId,
    ) -> Result<InventoryMovement, RepositoryError> {
        let row = sqlx::query_as::<_, MovementRow>(
            r"
            INSERT INTO ops.inventory_movement (
                ingredient_id, movement_type, quantity, unit_cost_at_time, note, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, ingredient_id, movement_type, quantity, unit_cost_at_time,
                      note, created_by, created_at
            ",
        )
        .bind(input.ingredient_id.as_i32())
        .bind(input.movement_type)
        .bind(input.quantity)
        .bind(input.unit_cost_at_time)
        .bind(&input.note)
        .bind(created_by.as_i32())
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_constraint_error(e, "inventory movement"))?;

        Ok(row.into())
    }

    /// List movements, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &mut self,
        filter: &MovementFilter,
    ) -> Result<Vec<InventoryMovement>, RepositoryError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r"
            SELECT id, ingredient_id, movement_type, quantity, unit_cost_at_time,
                   note, created_by, created_at
            FROM ops.inventory_movement
            WHERE ($1::int IS NULL OR ingredient_id = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(filter.ingredient_id.map(|id| id.as_i32()))
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.limit.unwrap_or(DEFAULT_LIMIT))
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
