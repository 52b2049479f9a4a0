//! Movement ledger and balance calculation.
//!
//! Balance of an ingredient is derived from the full ledger on every call:
//! `sum(IN) - sum(OUT) + sum(ADJUST)`. IN and OUT quantities are non-negative
//! magnitudes; ADJUST quantities carry their own sign.

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use solid_ops_core::{IngredientId, MovementType, UserId};

use crate::db::{Session, Store};
use crate::error::OpsError;
use crate::models::{
    IngredientBalance, InventoryMovement, MovementFilter, MovementTotal, RecordMovementInput,
};

/// Fold per-type totals into a balance. Missing types count as zero.
#[must_use]
pub fn balance_from_totals(totals: &[MovementTotal]) -> Decimal {
    totals
        .iter()
        .fold(Decimal::ZERO, |balance, t| match t.movement_type {
            MovementType::In | MovementType::Adjust => balance + t.total,
            MovementType::Out => balance - t.total,
        })
}

/// Raw ledger balance, without checking that the ingredient exists.
///
/// # Errors
///
/// Returns `OpsError::Repository` if the ledger cannot be read.
pub async fn ledger_balance<S: Session>(
    session: &mut S,
    ingredient_id: IngredientId,
) -> Result<Decimal, OpsError> {
    let totals = session.movement_totals(ingredient_id).await?;
    Ok(balance_from_totals(&totals))
}

/// Append a movement inside an existing session after enforcing ledger rules.
///
/// Rules, in order: the ingredient exists; IN and OUT quantities are not
/// negative; an OUT never exceeds the current balance; IN and ADJUST carry a
/// unit cost.
///
/// # Errors
///
/// Returns `NotFound`, `InvalidQuantity`, `InsufficientStock` or
/// `MissingUnitCost` when a rule is violated.
pub async fn append_movement<S: Session>(
    session: &mut S,
    input: &RecordMovementInput,
    actor: UserId,
) -> Result<InventoryMovement, OpsError> {
    if session.get_ingredient(input.ingredient_id).await?.is_none() {
        return Err(OpsError::NotFound(format!(
            "ingredient {}",
            input.ingredient_id
        )));
    }

    if input.movement_type != MovementType::Adjust && input.quantity.is_sign_negative() {
        return Err(OpsError::InvalidQuantity(format!(
            "{} quantity must not be negative, got {}",
            input.movement_type, input.quantity
        )));
    }

    if input.movement_type == MovementType::Out {
        let available = ledger_balance(session, input.ingredient_id).await?;
        debug!(
            ingredient_id = %input.ingredient_id,
            %available,
            required = %input.quantity,
            "Checking stock for outbound movement"
        );
        if available < input.quantity {
            return Err(OpsError::InsufficientStock {
                ingredient_id: input.ingredient_id,
                required: input.quantity,
                available,
            });
        }
    }

    if input.movement_type.requires_unit_cost() && input.unit_cost_at_time.is_none() {
        return Err(OpsError::MissingUnitCost);
    }

    Ok(session.insert_movement(input, actor).await?)
}

/// Stateless service over the movement ledger.
pub struct InventoryService<'a, St: Store> {
    store: &'a St,
}

impl<'a, St: Store> InventoryService<'a, St> {
    #[must_use]
    pub const fn new(store: &'a St) -> Self {
        Self { store }
    }

    /// Record one movement and commit it.
    ///
    /// # Errors
    ///
    /// See [`append_movement`]. Returns `OpsError::Repository` on storage failure.
    #[instrument(
        skip(self, input),
        fields(
            ingredient_id = %input.ingredient_id,
            movement_type = %input.movement_type,
            quantity = %input.quantity,
        )
    )]
    pub async fn record_movement(
        &self,
        input: &RecordMovementInput,
        actor: UserId,
    ) -> Result<InventoryMovement, OpsError> {
        let mut session = self.store.begin().await?;
        let movement = append_movement(&mut session, input, actor).await?;
        session.commit().await?;

        info!(movement_id = %movement.id, "Inventory movement recorded");
        Ok(movement)
    }

    /// Current ledger balance of an ingredient.
    ///
    /// An ingredient with no movements (or no row at all) has balance zero.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, ingredient_id: IngredientId) -> Result<Decimal, OpsError> {
        let mut session = self.store.begin().await?;
        ledger_balance(&mut session, ingredient_id).await
    }

    /// Balance of one ingredient together with its name and unit.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::NotFound` if the ingredient doesn't exist.
    #[instrument(skip(self))]
    pub async fn ingredient_balance(
        &self,
        ingredient_id: IngredientId,
    ) -> Result<IngredientBalance, OpsError> {
        let mut session = self.store.begin().await?;
        let ingredient = session
            .get_ingredient(ingredient_id)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("ingredient {ingredient_id}")))?;
        let balance = ledger_balance(&mut session, ingredient_id).await?;

        Ok(IngredientBalance {
            ingredient_id,
            ingredient_name: ingredient.name,
            unit: ingredient.unit,
            balance,
        })
    }

    /// Balances of every active ingredient, ordered by ingredient ID.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn balances(&self) -> Result<Vec<IngredientBalance>, OpsError> {
        let mut session = self.store.begin().await?;
        let ingredients = session.list_ingredients(true).await?;

        let mut balances = Vec::with_capacity(ingredients.len());
        for ingredient in ingredients {
            let balance = ledger_balance(&mut session, ingredient.id).await?;
            balances.push(IngredientBalance {
                ingredient_id: ingredient.id,
                ingredient_name: ingredient.name,
                unit: ingredient.unit,
                balance,
            });
        }
        Ok(balances)
    }

    /// Ledger entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Repository` on storage failure.
    #[instrument(skip(self, filter))]
    pub async fn movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<InventoryMovement>, OpsError> {
        let mut session = self.store.begin().await?;
        Ok(session.list_movements(filter).await?)
    }
}
