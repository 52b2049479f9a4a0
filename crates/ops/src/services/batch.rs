//! Batch planning and production.
//!
//! # Production
//!
//! Producing a batch runs in one session:
//!
//! 1. Load the batch (must be `PLANNED`) and resolve the actual units.
//! 2. Load the recipe lines with each ingredient's current cost.
//! 3. Scale every line by `actual_units / yield_quantity` and apply its waste
//!    factor.
//! 4. Validate stock for every line before writing anything.
//! 5. Write one OUT movement and one consumption per line, then freeze the
//!    cost snapshot on the batch.
//!
//! A failure at any step drops the session, so nothing is persisted.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use solid_ops_core::{BatchId, BatchStatus, MovementType, UserId};

use crate::db::{Session, Store};
use crate::error::OpsError;
use crate::models::{
    Batch, BatchDetail, BatchFilter, CostSnapshot, CreateBatchInput, NewBatch, NewConsumption,
    ProduceBatchInput, RecipeLine, RecordMovementInput,
};
use crate::services::inventory::{append_movement, ledger_balance};

/// Prefix of generated batch codes.
pub const BATCH_CODE_PREFIX: &str = "SOL";

// =============================================================================
// Pure helpers
// =============================================================================

/// Code for the `attempt`-th batch planned in the second `timestamp`.
///
/// The first attempt has no suffix; later ones get `-2`, `-3`, ...
#[must_use]
pub fn batch_code(timestamp: i64, attempt: u32) -> String {
    if attempt <= 1 {
        format!("{BATCH_CODE_PREFIX}-{timestamp}")
    } else {
        format!("{BATCH_CODE_PREFIX}-{timestamp}-{attempt}")
    }
}

/// Ratio between produced units and the recipe yield.
///
/// # Errors
///
/// Returns `OpsError::InvalidYield` if the yield is not positive.
pub fn scale_factor(actual_units: Decimal, yield_quantity: Decimal) -> Result<Decimal, OpsError> {
    if yield_quantity <= Decimal::ZERO {
        return Err(OpsError::InvalidYield(yield_quantity));
    }
    actual_units
        .checked_div(yield_quantity)
        .ok_or(OpsError::InvalidYield(yield_quantity))
}

/// Quantity a line consumes at `factor`, waste included.
///
/// # Errors
///
/// Returns `OpsError::InvalidQuantity` if the result overflows.
pub fn required_quantity(line: &RecipeLine, factor: Decimal) -> Result<Decimal, OpsError> {
    Decimal::ONE
        .checked_add(line.waste_factor)
        .and_then(|waste| line.quantity.checked_mul(factor)?.checked_mul(waste))
        .ok_or_else(|| OpsError::overflow(&format!("quantity for ingredient {}", line.ingredient_id)))
}

/// Cost per produced unit; zero when nothing was produced.
#[must_use]
pub fn per_unit_cost(total: Decimal, actual_units: Decimal) -> Decimal {
    if actual_units > Decimal::ZERO {
        total.checked_div(actual_units).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

/// First free batch code for `timestamp`.
///
/// # Errors
///
/// Returns `OpsError::Repository` on storage failure.
pub async fn unique_batch_code<S: Session>(
    session: &mut S,
    timestamp: i64,
) -> Result<String, OpsError> {
    let mut attempt = 1;
    loop {
        let code = batch_code(timestamp, attempt);
        if !session.batch_code_exists(&code).await? {
            return Ok(code);
        }
        attempt += 1;
    }
}

// =============================================================================
// Service
// =============================================================================

/// Stateless service over production batches.
pub struct BatchService<'a, St: Store> {
    store: &'a St,
}

impl<'a, St: Store> BatchService<'a, St> {
    #[must_use]
    pub const fn new(store: &'a St) -> Self {
        Self { store }
    }

    /// Plan a batch. No stock is checked or reserved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown recipe and `InvalidQuantity` for
    /// negative planned units.
    #[instrument(skip(self, input), fields(recipe_id = %input.recipe_id, planned_units = %input.planned_units))]
    pub async fn create(&self, input: &CreateBatchInput, actor: UserId) -> Result<Batch, OpsError> {
        if input.planned_units.is_sign_negative() {
            return Err(OpsError::InvalidQuantity(format!(
                "planned units must not be negative, got {}",
                input.planned_units
            )));
        }

        let mut session = self.store.begin().await?;
        if session.get_recipe(input.recipe_id).await?.is_none() {
            return Err(OpsError::NotFound(format!("recipe {}", input.recipe_id)));
        }

        let code = unique_batch_code(&mut session, Utc::now().timestamp()).await?;
        let batch = session
            .insert_batch(&NewBatch {
                code,
                recipe_id: input.recipe_id,
                planned_units: input.planned_units,
                created_by: actor,
            })
            .await?;
        session.commit().await?;

        info!(batch_id = %batch.id, code = %batch.code, "Batch planned");
        Ok(batch)
    }

    /// Produce a planned batch, consuming stock all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidState` (not `PLANNED`), `InvalidQuantity`
    /// (negative actual units), `RecipeMissingOrEmpty`, `InvalidYield` or
    /// `InsufficientStock` naming the first short ingredient. Nothing is
    /// written on error.
    #[instrument(skip(self, input))]
    pub async fn produce(
        &self,
        id: BatchId,
        input: &ProduceBatchInput,
        actor: UserId,
    ) -> Result<Batch, OpsError> {
        let mut session = self.store.begin().await?;

        let batch = session
            .get_batch(id)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("batch {id}")))?;
        if batch.status != BatchStatus::Planned {
            return Err(OpsError::InvalidState(batch.status));
        }

        let actual_units = input.actual_units.unwrap_or(batch.planned_units);
        if actual_units.is_sign_negative() {
            return Err(OpsError::InvalidQuantity(format!(
                "actual units must not be negative, got {actual_units}"
            )));
        }

        let recipe = session.get_recipe(batch.recipe_id).await?;
        let lines = session.recipe_lines(batch.recipe_id).await?;
        let Some(recipe) = recipe.filter(|_| !lines.is_empty()) else {
            return Err(OpsError::RecipeMissingOrEmpty(batch.recipe_id));
        };
        let factor = scale_factor(actual_units, recipe.yield_quantity)?;

        // Validation pass: every line must be covered before anything is written.
        let mut deductions = Vec::with_capacity(lines.len());
        let mut total = Decimal::ZERO;
        for line in &lines {
            let needed = required_quantity(line, factor)?;
            let available = ledger_balance(&mut session, line.ingredient_id).await?;
            debug!(
                ingredient_id = %line.ingredient_id,
                %needed,
                %available,
                "Checking stock for production"
            );
            if available < needed {
                return Err(OpsError::InsufficientStock {
                    ingredient_id: line.ingredient_id,
                    required: needed,
                    available,
                });
            }
            total = needed
                .checked_mul(line.cost_per_unit)
                .and_then(|cost| total.checked_add(cost))
                .ok_or_else(|| OpsError::overflow("batch cost"))?;
            deductions.push(NewConsumption {
                ingredient_id: line.ingredient_id,
                quantity_used: needed,
                unit_cost_at_time: line.cost_per_unit,
            });
        }

        // Execution pass.
        let note = format!("Production Batch {}", batch.code);
        for deduction in &deductions {
            append_movement(
                &mut session,
                &RecordMovementInput {
                    ingredient_id: deduction.ingredient_id,
                    movement_type: MovementType::Out,
                    quantity: deduction.quantity_used,
                    unit_cost_at_time: Some(deduction.unit_cost_at_time),
                    note: Some(note.clone()),
                },
                actor,
            )
            .await?;
            session.insert_consumption(batch.id, deduction).await?;
        }

        let snapshot = CostSnapshot {
            actual_units,
            total,
            per_unit: per_unit_cost(total, actual_units),
        };
        let produced = session
            .mark_batch_produced(batch.id, &snapshot)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("batch {id}")))?;
        session.commit().await?;

        info!(
            batch_id = %produced.id,
            code = %produced.code,
            %actual_units,
            cost_total = %snapshot.total,
            cost_per_unit = %snapshot.per_unit,
            "Batch produced"
        );
        Ok(produced)
    }

    /// Cancel a planned batch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `InvalidState` if the batch is not `PLANNED`.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: BatchId) -> Result<Batch, OpsError> {
        let mut session = self.store.begin().await?;
        let batch = session
            .get_batch(id)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("batch {id}")))?;
        if batch.status != BatchStatus::Planned {
            return Err(OpsError::InvalidState(batch.status));
        }

        let canceled = session
            .set_batch_status(id, BatchStatus::Canceled)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("batch {id}")))?;
        session.commit().await?;

        info!(batch_id = %id, code = %canceled.code, "Batch canceled");
        Ok(canceled)
    }

    /// Batch with its consumptions.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::NotFound` if the batch doesn't exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: BatchId) -> Result<BatchDetail, OpsError> {
        let mut session = self.store.begin().await?;
        let batch = session
            .get_batch(id)
            .await?
            .ok_or_else(|| OpsError::NotFound(format!("batch {id}")))?;
        let consumptions = session.list_consumptions(id).await?;
        Ok(BatchDetail {
            batch,
            consumptions,
        })
    }

    /// Batches matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Repository` on storage failure.
    #[instrument(skip(self, filter))]
    pub async fn list(&self, filter: &BatchFilter) -> Result<Vec<Batch>, OpsError> {
        let mut session = self.store.begin().await?;
        Ok(session.list_batches(filter).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use solid_ops_core::{IngredientId, RecipeId, RecipeItemId, Unit};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{CreateIngredientInput, CreateRecipeInput, RecipeItemInput};
    use crate::services::{InventoryService, RecipeService};

    const ACTOR: UserId = UserId::new(7);

    #[test]
    fn test_batch_code_suffix() {
        assert_eq!(batch_code(1_700_000_000, 1), "SOL-1700000000");
        assert_eq!(batch_code(1_700_000_000, 2), "SOL-1700000000-2");
    }

    #[test]
    fn test_scale_factor() {
        assert_eq!(scale_factor(dec!(20), dec!(10)).unwrap(), dec!(2));
        assert!(matches!(
            scale_factor(dec!(20), Decimal::ZERO),
            Err(OpsError::InvalidYield(_))
        ));
        assert!(matches!(
            scale_factor(dec!(20), dec!(-1)),
            Err(OpsError::InvalidYield(_))
        ));
    }

    #[test]
    fn test_required_quantity_applies_waste() {
        let line = RecipeLine {
            item_id: RecipeItemId::new(1),
            ingredient_id: IngredientId::new(1),
            ingredient_name: "Castor oil".to_string(),
            unit: Unit::Milliliter,
            cost_per_unit: dec!(0.03),
            quantity: dec!(100),
            waste_factor: dec!(0.1),
        };
        assert_eq!(required_quantity(&line, dec!(2)).unwrap(), dec!(220));
    }

    #[test]
    fn test_required_quantity_overflow_is_rejected() {
        let line = RecipeLine {
            item_id: RecipeItemId::new(1),
            ingredient_id: IngredientId::new(4),
            ingredient_name: "Kaolin clay".to_string(),
            unit: Unit::Gram,
            cost_per_unit: dec!(0.01),
            quantity: dec!(1000000000000000000000),
            waste_factor: Decimal::ZERO,
        };
        let result = required_quantity(&line, dec!(10000000000000000000));
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));
    }

    #[test]
    fn test_per_unit_cost_zero_units() {
        assert_eq!(per_unit_cost(dec!(12), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(per_unit_cost(dec!(12), dec!(4)), dec!(3));
    }

    struct Fixture {
        store: MemoryStore,
        oil: IngredientId,
        lye: IngredientId,
        recipe: RecipeId,
    }

    /// Recipe yielding 10 bars from 1000 ml oil (10% waste) and 150 g lye.
    async fn fixture(oil_stock: Decimal, lye_stock: Decimal) -> Fixture {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let oil = session
            .insert_ingredient(&CreateIngredientInput {
                name: "Olive oil".to_string(),
                unit: Unit::Milliliter,
                cost_per_unit: dec!(0.02),
                supplier_name: None,
            })
            .await
            .unwrap()
            .id;
        let lye = session
            .insert_ingredient(&CreateIngredientInput {
                name: "Sodium hydroxide".to_string(),
                unit: Unit::Gram,
                cost_per_unit: dec!(0.01),
                supplier_name: None,
            })
            .await
            .unwrap()
            .id;
        session.commit().await.unwrap();

        let recipe = RecipeService::new(&store)
            .create(&CreateRecipeInput {
                name: "Castile bar".to_string(),
                yield_quantity: dec!(10),
                yield_unit: Unit::Count,
                notes: None,
                items: vec![
                    RecipeItemInput {
                        ingredient_id: oil,
                        quantity: dec!(1000),
                        waste_factor: dec!(0.1),
                    },
                    RecipeItemInput {
                        ingredient_id: lye,
                        quantity: dec!(150),
                        waste_factor: Decimal::ZERO,
                    },
                ],
            })
            .await
            .unwrap()
            .recipe
            .id;

        let inventory = InventoryService::new(&store);
        for (id, stock) in [(oil, oil_stock), (lye, lye_stock)] {
            if stock > Decimal::ZERO {
                inventory
                    .record_movement(
                        &RecordMovementInput {
                            ingredient_id: id,
                            movement_type: MovementType::In,
                            quantity: stock,
                            unit_cost_at_time: Some(Decimal::ONE),
                            note: None,
                        },
                        ACTOR,
                    )
                    .await
                    .unwrap();
            }
        }

        Fixture {
            store,
            oil,
            lye,
            recipe,
        }
    }

    fn plan(recipe_id: RecipeId, units: Decimal) -> CreateBatchInput {
        CreateBatchInput {
            recipe_id,
            planned_units: units,
        }
    }

    #[tokio::test]
    async fn test_produce_consumes_scaled_quantities() {
        let f = fixture(dec!(5000), dec!(1000)).await;
        let service = BatchService::new(&f.store);
        let batch = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();
        assert_eq!(batch.status, BatchStatus::Planned);
        assert!(batch.code.starts_with("SOL-"));

        let produced = service
            .produce(
                batch.id,
                &ProduceBatchInput {
                    actual_units: Some(dec!(20)),
                },
                ACTOR,
            )
            .await
            .unwrap();

        // oil: 1000 * 2 * 1.1 = 2200 ml @ 0.02 = 44; lye: 150 * 2 = 300 g @ 0.01 = 3
        assert_eq!(produced.status, BatchStatus::Produced);
        assert_eq!(produced.actual_units, Some(dec!(20)));
        assert_eq!(produced.cost_snapshot_total, Some(dec!(47)));
        assert_eq!(produced.cost_snapshot_per_unit, Some(dec!(2.35)));

        let inventory = InventoryService::new(&f.store);
        assert_eq!(inventory.get_balance(f.oil).await.unwrap(), dec!(2800));
        assert_eq!(inventory.get_balance(f.lye).await.unwrap(), dec!(700));

        let detail = service.get(batch.id).await.unwrap();
        assert_eq!(detail.consumptions.len(), 2);
        let oil_used = detail
            .consumptions
            .iter()
            .find(|c| c.ingredient_id == f.oil)
            .unwrap();
        assert_eq!(oil_used.quantity_used, dec!(2200));
        assert_eq!(oil_used.unit_cost_at_time, dec!(0.02));

        let movements = inventory
            .movements(&crate::models::MovementFilter {
                ingredient_id: Some(f.oil),
                ..Default::default()
            })
            .await
            .unwrap();
        let out = movements.first().unwrap();
        assert_eq!(out.movement_type, MovementType::Out);
        assert_eq!(out.note.as_deref(), Some(format!("Production Batch {}", batch.code).as_str()));
        assert_eq!(out.created_by, ACTOR);
    }

    #[tokio::test]
    async fn test_produce_defaults_to_planned_units() {
        let f = fixture(dec!(5000), dec!(1000)).await;
        let service = BatchService::new(&f.store);
        let batch = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();

        let produced = service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await
            .unwrap();
        assert_eq!(produced.actual_units, Some(dec!(10)));
    }

    #[tokio::test]
    async fn test_shortage_on_second_line_writes_nothing() {
        let f = fixture(dec!(5000), dec!(10)).await;
        let service = BatchService::new(&f.store);
        let batch = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();

        let result = service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await;
        match result {
            Err(OpsError::InsufficientStock {
                ingredient_id,
                required,
                available,
            }) => {
                assert_eq!(ingredient_id, f.lye);
                assert_eq!(required, dec!(150));
                assert_eq!(available, dec!(10));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let inventory = InventoryService::new(&f.store);
        assert_eq!(inventory.get_balance(f.oil).await.unwrap(), dec!(5000));
        let detail = service.get(batch.id).await.unwrap();
        assert_eq!(detail.batch.status, BatchStatus::Planned);
        assert!(detail.consumptions.is_empty());
        assert!(detail.batch.cost_snapshot_total.is_none());
    }

    #[tokio::test]
    async fn test_produce_twice_is_invalid_state() {
        let f = fixture(dec!(5000), dec!(1000)).await;
        let service = BatchService::new(&f.store);
        let batch = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();
        service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await
            .unwrap();

        let result = service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await;
        assert!(matches!(
            result,
            Err(OpsError::InvalidState(BatchStatus::Produced))
        ));
    }

    #[tokio::test]
    async fn test_produce_zero_units() {
        let f = fixture(Decimal::ZERO, Decimal::ZERO).await;
        let service = BatchService::new(&f.store);
        let batch = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();

        let produced = service
            .produce(
                batch.id,
                &ProduceBatchInput {
                    actual_units: Some(Decimal::ZERO),
                },
                ACTOR,
            )
            .await
            .unwrap();
        assert_eq!(produced.cost_snapshot_total, Some(Decimal::ZERO));
        assert_eq!(produced.cost_snapshot_per_unit, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_negative_actual_units_rejected() {
        let f = fixture(dec!(5000), dec!(1000)).await;
        let service = BatchService::new(&f.store);
        let batch = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();

        let result = service
            .produce(
                batch.id,
                &ProduceBatchInput {
                    actual_units: Some(dec!(-1)),
                },
                ACTOR,
            )
            .await;
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));
    }

    /// Single-line recipe with the given line quantity, cost and yield.
    async fn single_line_recipe(
        store: &MemoryStore,
        quantity: Decimal,
        cost_per_unit: Decimal,
        yield_quantity: Decimal,
    ) -> (IngredientId, RecipeId) {
        let mut session = store.begin().await.unwrap();
        let clay = session
            .insert_ingredient(&CreateIngredientInput {
                name: "Kaolin clay".to_string(),
                unit: Unit::Gram,
                cost_per_unit,
                supplier_name: None,
            })
            .await
            .unwrap()
            .id;
        session.commit().await.unwrap();

        let recipe = RecipeService::new(store)
            .create(&CreateRecipeInput {
                name: "Clay mask".to_string(),
                yield_quantity,
                yield_unit: Unit::Count,
                notes: None,
                items: vec![RecipeItemInput {
                    ingredient_id: clay,
                    quantity,
                    waste_factor: Decimal::ZERO,
                }],
            })
            .await
            .unwrap()
            .recipe
            .id;
        (clay, recipe)
    }

    #[tokio::test]
    async fn test_produce_rejects_quantity_overflow() {
        let store = MemoryStore::new();
        let (_, recipe) = single_line_recipe(
            &store,
            dec!(1000000000000000000000),
            dec!(0.01),
            dec!(0.0000000001),
        )
        .await;
        let service = BatchService::new(&store);
        let batch = service
            .create(&plan(recipe, dec!(1000000000)), ACTOR)
            .await
            .unwrap();

        let result = service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await;
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));
        let detail = service.get(batch.id).await.unwrap();
        assert_eq!(detail.batch.status, BatchStatus::Planned);
    }

    #[tokio::test]
    async fn test_produce_rejects_cost_overflow() {
        let store = MemoryStore::new();
        let quantity = dec!(1000000000000000);
        let (clay, recipe) =
            single_line_recipe(&store, quantity, dec!(1000000000000000), dec!(1)).await;
        let inventory = InventoryService::new(&store);
        inventory
            .record_movement(
                &RecordMovementInput {
                    ingredient_id: clay,
                    movement_type: MovementType::In,
                    quantity,
                    unit_cost_at_time: Some(Decimal::ONE),
                    note: None,
                },
                ACTOR,
            )
            .await
            .unwrap();
        let service = BatchService::new(&store);
        let batch = service.create(&plan(recipe, dec!(1)), ACTOR).await.unwrap();

        let result = service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await;
        assert!(matches!(result, Err(OpsError::InvalidQuantity(_))));
        assert_eq!(inventory.get_balance(clay).await.unwrap(), quantity);
    }

    #[tokio::test]
    async fn test_empty_recipe_cannot_be_produced() {
        let store = MemoryStore::new();
        let recipe = RecipeService::new(&store)
            .create(&CreateRecipeInput {
                name: "Empty".to_string(),
                yield_quantity: dec!(1),
                yield_unit: Unit::Count,
                notes: None,
                items: Vec::new(),
            })
            .await
            .unwrap()
            .recipe
            .id;
        let service = BatchService::new(&store);
        let batch = service.create(&plan(recipe, dec!(1)), ACTOR).await.unwrap();

        let result = service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await;
        assert!(matches!(result, Err(OpsError::RecipeMissingOrEmpty(id)) if id == recipe));
    }

    #[tokio::test]
    async fn test_unknown_batch_and_recipe() {
        let store = MemoryStore::new();
        let service = BatchService::new(&store);

        let result = service
            .produce(BatchId::new(1), &ProduceBatchInput::default(), ACTOR)
            .await;
        assert!(matches!(result, Err(OpsError::NotFound(_))));

        let result = service.create(&plan(RecipeId::new(1), dec!(1)), ACTOR).await;
        assert!(matches!(result, Err(OpsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel() {
        let f = fixture(dec!(5000), dec!(1000)).await;
        let service = BatchService::new(&f.store);
        let batch = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();

        let canceled = service.cancel(batch.id).await.unwrap();
        assert_eq!(canceled.status, BatchStatus::Canceled);

        let result = service.cancel(batch.id).await;
        assert!(matches!(
            result,
            Err(OpsError::InvalidState(BatchStatus::Canceled))
        ));
        let result = service
            .produce(batch.id, &ProduceBatchInput::default(), ACTOR)
            .await;
        assert!(matches!(
            result,
            Err(OpsError::InvalidState(BatchStatus::Canceled))
        ));
    }

    #[tokio::test]
    async fn test_unique_batch_code_appends_suffix() {
        let f = fixture(dec!(1), dec!(1)).await;
        let mut session = f.store.begin().await.unwrap();
        for code in ["SOL-100", "SOL-100-2"] {
            session
                .insert_batch(&NewBatch {
                    code: code.to_string(),
                    recipe_id: f.recipe,
                    planned_units: dec!(1),
                    created_by: ACTOR,
                })
                .await
                .unwrap();
        }

        let code = unique_batch_code(&mut session, 100).await.unwrap();
        assert_eq!(code, "SOL-100-3");
        let code = unique_batch_code(&mut session, 101).await.unwrap();
        assert_eq!(code, "SOL-101");
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let f = fixture(dec!(5000), dec!(1000)).await;
        let service = BatchService::new(&f.store);
        let first = service.create(&plan(f.recipe, dec!(10)), ACTOR).await.unwrap();
        let second = service.create(&plan(f.recipe, dec!(5)), ACTOR).await.unwrap();
        assert_ne!(first.code, second.code);
        service.cancel(first.id).await.unwrap();

        let planned = service
            .list(&BatchFilter {
                status: Some(BatchStatus::Planned),
                ..BatchFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned.first().unwrap().id, second.id);
    }
}
