//! Recipe management and cost calculation.
//!
//! Costing uses `quantity * cost_per_unit` per line and ignores the waste
//! factor. Production consumption (see [`super::batch`]) applies it. The two
//! formulas are kept separate on purpose.

use rust_decimal::Decimal;
use tracing::{info, instrument};

use solid_ops_core::{IngredientId, RecipeId};

use crate::db::{DEFAULT_LIMIT, Session, Store};
use crate::error::OpsError;
use crate::models::{
    CreateRecipeInput, ItemCostBreakdown, Recipe, RecipeCost, RecipeDetail, RecipeItem,
    RecipeItemInput, RecipeLine, UpdateRecipeInput,
};

// =============================================================================
// Pure helpers
// =============================================================================

/// Build the cost sheet of a recipe from its joined lines.
///
/// `cost_per_unit` is zero when the yield is not positive.
///
/// # Errors
///
/// Returns `OpsError::InvalidQuantity` if a line cost or the total overflows.
pub fn cost_breakdown(recipe: &Recipe, lines: &[RecipeLine]) -> Result<RecipeCost, OpsError> {
    let breakdown = lines
        .iter()
        .map(|line| {
            let line_cost = line
                .quantity
                .checked_mul(line.cost_per_unit)
                .ok_or_else(|| {
                    OpsError::overflow(&format!("cost of ingredient {}", line.ingredient_id))
                })?;
            Ok(ItemCostBreakdown {
                ingredient_id: line.ingredient_id,
                ingredient_name: line.ingredient_name.clone(),
                quantity: line.quantity,
                unit: line.unit,
                unit_cost: line.cost_per_unit,
                line_cost,
            })
        })
        .collect::<Result<Vec<_>, OpsError>>()?;

    let total_cost = breakdown
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_cost))
        .ok_or_else(|| OpsError::overflow("recipe cost"))?;
    let cost_per_unit = if recipe.yield_quantity > Decimal::ZERO {
        total_cost
            .checked_div(recipe.yield_quantity)
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    Ok(RecipeCost {
        recipe_id: recipe.id,
        recipe_name: recipe.name.clone(),
        total_cost,
        cost_per_unit,
        yield_quantity: recipe.yield_quantity,
        breakdown,
    })
}

fn validate_yield(yield_quantity: Decimal) -> Result<(), OpsError> {
    if yield_quantity <= Decimal::ZERO {
        return Err(OpsError::InvalidYield(yield_quantity));
    }
    Ok(())
}

fn validate_item(item: &RecipeItemInput) -> Result<(), OpsError> {
    if item.quantity.is_sign_negative() {
        return Err(OpsError::InvalidQuantity(format!(
            "recipe item quantity must not be negative, got {}",
            item.quantity
        )));
    }
    if item.waste_factor.is_sign_negative() {
        return Err(OpsError::InvalidQuantity(format!(
            "waste factor must not be negative, got {}",
            item.waste_factor
        )));
    }
    Ok(())
}

async fn require_recipe<S: Session>(session: &mut S, id: RecipeId) -> Result<Recipe, OpsError> {
    session
        .get_recipe(id)
        .await?
        .ok_or_else(|| OpsError::NotFound(format!("recipe {id}")))
}

async fn require_ingredient<S: Session>(
    session: &mut S,
    id: IngredientId,
) -> Result<(), OpsError> {
    if session.get_ingredient(id).await?.is_none() {
        return Err(OpsError::NotFound(format!("ingredient {id}")));
    }
    Ok(())
}

// =============================================================================
// Service
// =============================================================================

/// Stateless service over recipes and their lines.
pub struct RecipeService<'a, St: Store> {
    store: &'a St,
}

impl<'a, St: Store> RecipeService<'a, St> {
    #[must_use]
    pub const fn new(store: &'a St) -> Self {
        Self { store }
    }

    /// Create a recipe together with its lines.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` for a duplicate name, `InvalidYield` for a
    /// non-positive yield, `InvalidQuantity` for a negative line quantity or
    /// waste factor and `NotFound` for an unknown ingredient.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &CreateRecipeInput) -> Result<RecipeDetail, OpsError> {
        validate_yield(input.yield_quantity)?;
        for item in &input.items {
            validate_item(item)?;
        }

        let mut session = self.store.begin().await?;
        if session.find_recipe_by_name(&input.name).await?.is_some() {
            return Err(OpsError::Conflict(format!(
                "recipe name '{}' already exists",
                input.name
            )));
        }

        let recipe = session.insert_recipe(input).await?;
        for item in &input.items {
            require_ingredient(&mut session, item.ingredient_id).await?;
            session.upsert_recipe_item(recipe.id, item).await?;
        }
        let items = session.list_recipe_items(recipe.id).await?;
        session.commit().await?;

        info!(recipe_id = %recipe.id, items = items.len(), "Recipe created");
        Ok(RecipeDetail { recipe, items })
    }

    /// Recipe header plus lines in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::NotFound` if the recipe doesn't exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: RecipeId) -> Result<RecipeDetail, OpsError> {
        let mut session = self.store.begin().await?;
        let recipe = require_recipe(&mut session, id).await?;
        let items = session.list_recipe_items(id).await?;
        Ok(RecipeDetail { recipe, items })
    }

    /// List recipes ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Recipe>, OpsError> {
        let mut session = self.store.begin().await?;
        Ok(session
            .list_recipes(limit.unwrap_or(DEFAULT_LIMIT), offset.unwrap_or(0))
            .await?)
    }

    /// Apply a partial update to a recipe header.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidYield` or `Conflict` (name taken).
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: RecipeId, input: &UpdateRecipeInput) -> Result<Recipe, OpsError> {
        if let Some(yield_quantity) = input.yield_quantity {
            validate_yield(yield_quantity)?;
        }

        let mut session = self.store.begin().await?;
        let recipe = session
            .update_recipe(id, input)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("recipe {id}")))?;
        session.commit().await?;

        info!(recipe_id = %id, "Recipe updated");
        Ok(recipe)
    }

    /// Add a line, or overwrite quantity and waste factor of an existing one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown recipe or ingredient and
    /// `InvalidQuantity` for a negative quantity or waste factor.
    #[instrument(skip(self, input), fields(ingredient_id = %input.ingredient_id))]
    pub async fn upsert_item(
        &self,
        recipe_id: RecipeId,
        input: &RecipeItemInput,
    ) -> Result<RecipeItem, OpsError> {
        validate_item(input)?;

        let mut session = self.store.begin().await?;
        require_recipe(&mut session, recipe_id).await?;
        require_ingredient(&mut session, input.ingredient_id).await?;
        let item = session.upsert_recipe_item(recipe_id, input).await?;
        session.commit().await?;

        info!(recipe_item_id = %item.id, "Recipe item saved");
        Ok(item)
    }

    /// Remove the line for `ingredient_id`.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::NotFound` if the recipe has no such line.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> Result<(), OpsError> {
        let mut session = self.store.begin().await?;
        if !session.delete_recipe_item(recipe_id, ingredient_id).await? {
            return Err(OpsError::NotFound(format!(
                "item for ingredient {ingredient_id} in recipe {recipe_id}"
            )));
        }
        session.commit().await?;

        info!("Recipe item removed");
        Ok(())
    }

    /// Cost sheet at current ingredient costs. Read-only.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::NotFound` if the recipe doesn't exist.
    #[instrument(skip(self))]
    pub async fn calculate_cost(&self, id: RecipeId) -> Result<RecipeCost, OpsError> {
        let mut session = self.store.begin().await?;
        let recipe = require_recipe(&mut session, id).await?;
        let lines = session.recipe_lines(id).await?;
        cost_breakdown(&recipe, &lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use solid_ops_core::{RecipeItemId, Unit};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::CreateIngredientInput;

    fn line(id: i32, name: &str, unit: Unit, cost: Decimal, quantity: Decimal) -> RecipeLine {
        RecipeLine {
            item_id: RecipeItemId::new(id),
            ingredient_id: IngredientId::new(id),
            ingredient_name: name.to_string(),
            unit,
            cost_per_unit: cost,
            quantity,
            waste_factor: dec!(0.5),
        }
    }

    fn recipe_with_yield(yield_quantity: Decimal) -> Recipe {
        Recipe {
            id: RecipeId::new(1),
            name: "Shampoo bar".to_string(),
            yield_quantity,
            yield_unit: Unit::Count,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cost_breakdown_ignores_waste_factor() {
        let lines = [
            line(1, "Flour", Unit::Gram, dec!(0.005), dec!(500)),
            line(2, "Sugar", Unit::Gram, dec!(0.002), dec!(200)),
            line(3, "Eggs", Unit::Count, dec!(0.50), dec!(3)),
        ];

        let cost = cost_breakdown(&recipe_with_yield(dec!(2)), &lines).unwrap();

        assert_eq!(cost.total_cost, dec!(4.40));
        assert_eq!(cost.cost_per_unit, dec!(2.20));
        assert_eq!(cost.breakdown.len(), 3);
        assert_eq!(cost.breakdown.first().unwrap().line_cost, dec!(2.5));
    }

    #[test]
    fn test_cost_breakdown_zero_yield() {
        let lines = [line(1, "Flour", Unit::Gram, dec!(0.005), dec!(500))];
        let cost = cost_breakdown(&recipe_with_yield(Decimal::ZERO), &lines).unwrap();
        assert_eq!(cost.total_cost, dec!(2.5));
        assert_eq!(cost.cost_per_unit, Decimal::ZERO);
    }

    #[test]
    fn test_cost_breakdown_empty_recipe() {
        let cost = cost_breakdown(&recipe_with_yield(dec!(1)), &[]).unwrap();
        assert_eq!(cost.total_cost, Decimal::ZERO);
        assert!(cost.breakdown.is_empty());
    }

    #[test]
    fn test_cost_breakdown_overflow_is_rejected() {
        let lines = [line(
            1,
            "Titanium dioxide",
            Unit::Gram,
            dec!(1000000000000000),
            dec!(1000000000000000000),
        )];
        let result = cost_breakdown(&recipe_with_yield(dec!(1)), &lines);
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));

        // Each line fits, the sum does not.
        let lines = [
            line(1, "Mica", Unit::Gram, dec!(50000000000000), dec!(1000000000000000)),
            line(2, "Clay", Unit::Gram, dec!(50000000000000), dec!(1000000000000000)),
        ];
        let result = cost_breakdown(&recipe_with_yield(dec!(1)), &lines);
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));
    }

    async fn store_with_ingredient() -> (MemoryStore, IngredientId) {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let ingredient = session
            .insert_ingredient(&CreateIngredientInput {
                name: "Cocoa butter".to_string(),
                unit: Unit::Gram,
                cost_per_unit: dec!(0.08),
                supplier_name: Some("Atelier Cacau".to_string()),
            })
            .await
            .unwrap();
        session.commit().await.unwrap();
        (store, ingredient.id)
    }

    fn create_input(name: &str, ingredient_id: IngredientId) -> CreateRecipeInput {
        CreateRecipeInput {
            name: name.to_string(),
            yield_quantity: dec!(10),
            yield_unit: Unit::Count,
            notes: None,
            items: vec![RecipeItemInput {
                ingredient_id,
                quantity: dec!(250),
                waste_factor: dec!(0.05),
            }],
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (store, ingredient_id) = store_with_ingredient().await;
        let service = RecipeService::new(&store);

        let created = service
            .create(&create_input("Lip balm", ingredient_id))
            .await
            .unwrap();
        let fetched = service.get(created.recipe.id).await.unwrap();

        assert_eq!(fetched.recipe.name, "Lip balm");
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items, created.items);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (store, ingredient_id) = store_with_ingredient().await;
        let service = RecipeService::new(&store);
        service
            .create(&create_input("Lip balm", ingredient_id))
            .await
            .unwrap();

        let result = service.create(&create_input("Lip balm", ingredient_id)).await;
        assert!(matches!(result, Err(OpsError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_non_positive_yield_rejected() {
        let (store, ingredient_id) = store_with_ingredient().await;
        let service = RecipeService::new(&store);
        let mut input = create_input("Lip balm", ingredient_id);
        input.yield_quantity = Decimal::ZERO;

        let result = service.create(&input).await;
        assert!(matches!(result, Err(OpsError::InvalidYield(_))));
    }

    #[tokio::test]
    async fn test_unknown_ingredient_rolls_back_create() {
        let (store, _) = store_with_ingredient().await;
        let service = RecipeService::new(&store);

        let result = service
            .create(&create_input("Lip balm", IngredientId::new(99)))
            .await;
        assert!(matches!(result, Err(OpsError::NotFound(_))));
        assert!(service.list(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_pair() {
        let (store, ingredient_id) = store_with_ingredient().await;
        let service = RecipeService::new(&store);
        let created = service
            .create(&create_input("Lip balm", ingredient_id))
            .await
            .unwrap();

        let item = service
            .upsert_item(
                created.recipe.id,
                &RecipeItemInput {
                    ingredient_id,
                    quantity: dec!(300),
                    waste_factor: dec!(0.1),
                },
            )
            .await
            .unwrap();

        let detail = service.get(created.recipe.id).await.unwrap();
        assert_eq!(detail.items, vec![item]);
        assert_eq!(detail.items.first().unwrap().quantity, dec!(300));
    }

    #[tokio::test]
    async fn test_negative_waste_factor_rejected() {
        let (store, ingredient_id) = store_with_ingredient().await;
        let service = RecipeService::new(&store);
        let created = service
            .create(&create_input("Lip balm", ingredient_id))
            .await
            .unwrap();

        let result = service
            .upsert_item(
                created.recipe.id,
                &RecipeItemInput {
                    ingredient_id,
                    quantity: dec!(300),
                    waste_factor: dec!(-0.1),
                },
            )
            .await;
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));
    }

    #[tokio::test]
    async fn test_remove_item() {
        let (store, ingredient_id) = store_with_ingredient().await;
        let service = RecipeService::new(&store);
        let created = service
            .create(&create_input("Lip balm", ingredient_id))
            .await
            .unwrap();

        service
            .remove_item(created.recipe.id, ingredient_id)
            .await
            .unwrap();
        assert!(service.get(created.recipe.id).await.unwrap().items.is_empty());

        let result = service.remove_item(created.recipe.id, ingredient_id).await;
        assert!(matches!(result, Err(OpsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_calculate_cost_missing_recipe() {
        let store = MemoryStore::new();
        let result = RecipeService::new(&store)
            .calculate_cost(RecipeId::new(5))
            .await;
        assert!(matches!(result, Err(OpsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_calculate_cost_overflow_is_rejected() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let pigment = session
            .insert_ingredient(&CreateIngredientInput {
                name: "Ultramarine blue".to_string(),
                unit: Unit::Gram,
                cost_per_unit: dec!(1000000000000000),
                supplier_name: None,
            })
            .await
            .unwrap();
        session.commit().await.unwrap();

        let service = RecipeService::new(&store);
        let mut input = create_input("Pigment bar", pigment.id);
        input.yield_quantity = dec!(1);
        input.items[0].quantity = dec!(1000000000000000000);
        input.items[0].waste_factor = Decimal::ZERO;
        let created = service.create(&input).await.unwrap();

        let result = service.calculate_cost(created.recipe.id).await;
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));
    }

    #[tokio::test]
    async fn test_update_rename() {
        let (store, ingredient_id) = store_with_ingredient().await;
        let service = RecipeService::new(&store);
        let created = service
            .create(&create_input("Lip balm", ingredient_id))
            .await
            .unwrap();

        let updated = service
            .update(
                created.recipe.id,
                &UpdateRecipeInput {
                    name: Some("Tinted lip balm".to_string()),
                    ..UpdateRecipeInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Tinted lip balm");
        assert_eq!(updated.yield_quantity, dec!(10));
    }
}
