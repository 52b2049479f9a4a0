//! Ingredient catalog.

use rust_decimal::Decimal;
use tracing::{info, instrument};

use solid_ops_core::IngredientId;

use crate::db::{Session, Store};
use crate::error::OpsError;
use crate::models::{CreateIngredientInput, Ingredient, UpdateIngredientInput};

fn validate_cost(cost: Decimal) -> Result<(), OpsError> {
    if cost.is_sign_negative() {
        return Err(OpsError::InvalidQuantity(format!(
            "cost per unit must not be negative, got {cost}"
        )));
    }
    Ok(())
}

/// Stateless service over ingredients.
pub struct IngredientService<'a, St: Store> {
    store: &'a St,
}

impl<'a, St: Store> IngredientService<'a, St> {
    #[must_use]
    pub const fn new(store: &'a St) -> Self {
        Self { store }
    }

    /// Create an active ingredient.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::InvalidQuantity` for a negative cost.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &CreateIngredientInput) -> Result<Ingredient, OpsError> {
        validate_cost(input.cost_per_unit)?;

        let mut session = self.store.begin().await?;
        let ingredient = session.insert_ingredient(input).await?;
        session.commit().await?;

        info!(ingredient_id = %ingredient.id, "Ingredient created");
        Ok(ingredient)
    }

    /// # Errors
    ///
    /// Returns `OpsError::NotFound` if the ingredient doesn't exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: IngredientId) -> Result<Ingredient, OpsError> {
        let mut session = self.store.begin().await?;
        session
            .get_ingredient(id)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("ingredient {id}")))
    }

    /// # Errors
    ///
    /// Returns `OpsError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn list(&self, active_only: bool) -> Result<Vec<Ingredient>, OpsError> {
        let mut session = self.store.begin().await?;
        Ok(session.list_ingredients(active_only).await?)
    }

    /// Apply a partial update. Produced batches keep their frozen costs.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `InvalidQuantity` for a negative cost.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: IngredientId,
        input: &UpdateIngredientInput,
    ) -> Result<Ingredient, OpsError> {
        if let Some(cost) = input.cost_per_unit {
            validate_cost(cost)?;
        }

        let mut session = self.store.begin().await?;
        let ingredient = session
            .update_ingredient(id, input)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("ingredient {id}")))?;
        session.commit().await?;

        info!(ingredient_id = %id, "Ingredient updated");
        Ok(ingredient)
    }

    /// Soft delete: the row and its ledger stay, `active` becomes false.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::NotFound` if the ingredient doesn't exist.
    pub async fn deactivate(&self, id: IngredientId) -> Result<Ingredient, OpsError> {
        self.update(
            id,
            &UpdateIngredientInput {
                active: Some(false),
                ..UpdateIngredientInput::default()
            },
        )
        .await
    }
}
