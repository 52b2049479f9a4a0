//! In-memory backend.
//!
//! Intended for tests and local experiments. A session takes the store lock
//! for its whole lifetime and works on a private copy of the tables, so
//! sessions are fully serialized and a dropped session leaves no trace.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use solid_ops_core::{
    BatchConsumptionId, BatchId, BatchStatus, IngredientId, MovementId, MovementType, RecipeId,
    RecipeItemId, UserId,
};

use super::{DEFAULT_LIMIT, RepositoryError, Session, Store};
use crate::models::{
    Batch, BatchConsumption, BatchFilter, CostSnapshot, CreateIngredientInput, CreateRecipeInput,
    Ingredient, InventoryMovement, MovementFilter, MovementTotal, NewBatch, NewConsumption, Recipe,
    RecipeItem, RecipeItemInput, RecipeLine, RecordMovementInput, UpdateIngredientInput,
    UpdateRecipeInput,
};

#[derive(Debug, Clone, Copy, Default)]
struct Sequences {
    ingredient: i32,
    movement: i32,
    recipe: i32,
    recipe_item: i32,
    batch: i32,
    consumption: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    ingredients: Vec<Ingredient>,
    movements: Vec<InventoryMovement>,
    recipes: Vec<Recipe>,
    recipe_items: Vec<RecipeItem>,
    batches: Vec<Batch>,
    consumptions: Vec<BatchConsumption>,
    sequences: Sequences,
}

impl Tables {
    fn ingredient_exists(&self, id: IngredientId) -> bool {
        self.ingredients.iter().any(|i| i.id == id)
    }

    fn recipe_exists(&self, id: RecipeId) -> bool {
        self.recipes.iter().any(|r| r.id == id)
    }
}

/// Paginate an already ordered iterator the way `LIMIT/OFFSET` does.
fn page<T>(rows: impl Iterator<Item = T>, limit: Option<i64>, offset: Option<i64>) -> Vec<T> {
    let offset = usize::try_from(offset.unwrap_or(0)).unwrap_or(0);
    let limit = usize::try_from(limit.unwrap_or(DEFAULT_LIMIT)).unwrap_or(0);
    rows.skip(offset).take(limit).collect()
}

/// Store keeping all tables in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(MemorySession { guard, working })
    }
}

/// Exclusive session over a [`MemoryStore`].
pub struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl Session for MemorySession {
    // =========================================================================
    // Ingredients
    // =========================================================================

    async fn insert_ingredient(
        &mut self,
        input: &CreateIngredientInput,
    ) -> Result<Ingredient, RepositoryError> {
        let now = Utc::now();
        let ingredient = Ingredient {
            id: IngredientId::new(next_id(&mut self.working.sequences.ingredient)),
            name: input.name.clone(),
            unit: input.unit,
            cost_per_unit: input.cost_per_unit,
            supplier_name: input.supplier_name.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.working.ingredients.push(ingredient.clone());
        Ok(ingredient)
    }

    async fn get_ingredient(
        &mut self,
        id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        Ok(self.working.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn list_ingredients(
        &mut self,
        active_only: bool,
    ) -> Result<Vec<Ingredient>, RepositoryError> {
        Ok(self
            .working
            .ingredients
            .iter()
            .filter(|i| !active_only || i.active)
            .cloned()
            .collect())
    }

    async fn update_ingredient(
        &mut self,
        id: IngredientId,
        input: &UpdateIngredientInput,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        let Some(ingredient) = self.working.ingredients.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            ingredient.name.clone_from(name);
        }
        if let Some(unit) = input.unit {
            ingredient.unit = unit;
        }
        if let Some(cost) = input.cost_per_unit {
            ingredient.cost_per_unit = cost;
        }
        if let Some(supplier) = &input.supplier_name {
            ingredient.supplier_name = Some(supplier.clone());
        }
        if let Some(active) = input.active {
            ingredient.active = active;
        }
        ingredient.updated_at = Utc::now();
        Ok(Some(ingredient.clone()))
    }

    // =========================================================================
    // Movement ledger
    // =========================================================================

    async fn movement_totals(
        &mut self,
        ingredient_id: IngredientId,
    ) -> Result<Vec<MovementTotal>, RepositoryError> {
        let totals = [MovementType::In, MovementType::Out, MovementType::Adjust]
            .into_iter()
            .filter_map(|movement_type| {
                let mut rows = self
                    .working
                    .movements
                    .iter()
                    .filter(|m| m.ingredient_id == ingredient_id && m.movement_type == movement_type)
                    .peekable();
                rows.peek()?;
                let total = rows.map(|m| m.quantity).sum::<Decimal>();
                Some(MovementTotal {
                    movement_type,
                    total,
                })
            })
            .collect();
        Ok(totals)
    }

    async fn insert_movement(
        &mut self,
        input: &RecordMovementInput,
        created_by: UserId,
    ) -> Result<InventoryMovement, RepositoryError> {
        if !self.working.ingredient_exists(input.ingredient_id) {
            return Err(RepositoryError::Conflict(
                "inventory movement (ingredient)".to_string(),
            ));
        }
        let movement = InventoryMovement {
            id: MovementId::new(next_id(&mut self.working.sequences.movement)),
            ingredient_id: input.ingredient_id,
            movement_type: input.movement_type,
            quantity: input.quantity,
            unit_cost_at_time: input.unit_cost_at_time,
            note: input.note.clone(),
            created_by,
            created_at: Utc::now(),
        };
        self.working.movements.push(movement.clone());
        Ok(movement)
    }

    async fn list_movements(
        &mut self,
        filter: &MovementFilter,
    ) -> Result<Vec<InventoryMovement>, RepositoryError> {
        let mut rows: Vec<&InventoryMovement> = self
            .working
            .movements
            .iter()
            .filter(|m| filter.ingredient_id.is_none_or(|id| m.ingredient_id == id))
            .filter(|m| filter.start.is_none_or(|start| m.created_at >= start))
            .filter(|m| filter.end.is_none_or(|end| m.created_at <= end))
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(page(rows.into_iter().cloned(), filter.limit, filter.offset))
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    async fn insert_recipe(&mut self, input: &CreateRecipeInput) -> Result<Recipe, RepositoryError> {
        if self.working.recipes.iter().any(|r| r.name == input.name) {
            return Err(RepositoryError::Conflict(
                "recipe name already exists (recipe_name_key)".to_string(),
            ));
        }
        let now = Utc::now();
        let recipe = Recipe {
            id: RecipeId::new(next_id(&mut self.working.sequences.recipe)),
            name: input.name.clone(),
            yield_quantity: input.yield_quantity,
            yield_unit: input.yield_unit,
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.working.recipes.push(recipe.clone());
        Ok(recipe)
    }

    async fn get_recipe(&mut self, id: RecipeId) -> Result<Option<Recipe>, RepositoryError> {
        Ok(self.working.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn find_recipe_by_name(&mut self, name: &str) -> Result<Option<Recipe>, RepositoryError> {
        Ok(self.working.recipes.iter().find(|r| r.name == name).cloned())
    }

    async fn list_recipes(&mut self, limit: i64, offset: i64) -> Result<Vec<Recipe>, RepositoryError> {
        Ok(page(
            self.working.recipes.iter().cloned(),
            Some(limit),
            Some(offset),
        ))
    }

    async fn update_recipe(
        &mut self,
        id: RecipeId,
        input: &UpdateRecipeInput,
    ) -> Result<Option<Recipe>, RepositoryError> {
        if let Some(name) = &input.name
            && self
                .working
                .recipes
                .iter()
                .any(|r| r.id != id && &r.name == name)
        {
            return Err(RepositoryError::Conflict(
                "recipe name already exists (recipe_name_key)".to_string(),
            ));
        }
        let Some(recipe) = self.working.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            recipe.name.clone_from(name);
        }
        if let Some(yield_quantity) = input.yield_quantity {
            recipe.yield_quantity = yield_quantity;
        }
        if let Some(yield_unit) = input.yield_unit {
            recipe.yield_unit = yield_unit;
        }
        if let Some(notes) = &input.notes {
            recipe.notes = Some(notes.clone());
        }
        recipe.updated_at = Utc::now();
        Ok(Some(recipe.clone()))
    }

    async fn upsert_recipe_item(
        &mut self,
        recipe_id: RecipeId,
        input: &RecipeItemInput,
    ) -> Result<RecipeItem, RepositoryError> {
        if !self.working.recipe_exists(recipe_id) || !self.working.ingredient_exists(input.ingredient_id)
        {
            return Err(RepositoryError::Conflict(
                "recipe item (foreign key)".to_string(),
            ));
        }
        if let Some(item) = self
            .working
            .recipe_items
            .iter_mut()
            .find(|i| i.recipe_id == recipe_id && i.ingredient_id == input.ingredient_id)
        {
            item.quantity = input.quantity;
            item.waste_factor = input.waste_factor;
            return Ok(item.clone());
        }
        let item = RecipeItem {
            id: RecipeItemId::new(next_id(&mut self.working.sequences.recipe_item)),
            recipe_id,
            ingredient_id: input.ingredient_id,
            quantity: input.quantity,
            waste_factor: input.waste_factor,
        };
        self.working.recipe_items.push(item.clone());
        Ok(item)
    }

    async fn delete_recipe_item(
        &mut self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> Result<bool, RepositoryError> {
        let before = self.working.recipe_items.len();
        self.working
            .recipe_items
            .retain(|i| !(i.recipe_id == recipe_id && i.ingredient_id == ingredient_id));
        Ok(self.working.recipe_items.len() < before)
    }

    async fn list_recipe_items(
        &mut self,
        recipe_id: RecipeId,
    ) -> Result<Vec<RecipeItem>, RepositoryError> {
        Ok(self
            .working
            .recipe_items
            .iter()
            .filter(|i| i.recipe_id == recipe_id)
            .cloned()
            .collect())
    }

    async fn recipe_lines(&mut self, recipe_id: RecipeId) -> Result<Vec<RecipeLine>, RepositoryError> {
        let tables = &self.working;
        Ok(tables
            .recipe_items
            .iter()
            .filter(|item| item.recipe_id == recipe_id)
            .filter_map(|item| {
                let ingredient = tables
                    .ingredients
                    .iter()
                    .find(|i| i.id == item.ingredient_id)?;
                Some(RecipeLine {
                    item_id: item.id,
                    ingredient_id: item.ingredient_id,
                    ingredient_name: ingredient.name.clone(),
                    unit: ingredient.unit,
                    cost_per_unit: ingredient.cost_per_unit,
                    quantity: item.quantity,
                    waste_factor: item.waste_factor,
                })
            })
            .collect())
    }

    // =========================================================================
    // Batches
    // =========================================================================

    async fn batch_code_exists(&mut self, code: &str) -> Result<bool, RepositoryError> {
        Ok(self.working.batches.iter().any(|b| b.code == code))
    }

    async fn insert_batch(&mut self, batch: &NewBatch) -> Result<Batch, RepositoryError> {
        if self.working.batches.iter().any(|b| b.code == batch.code) {
            return Err(RepositoryError::Conflict("batch (batch_code_key)".to_string()));
        }
        if !self.working.recipe_exists(batch.recipe_id) {
            return Err(RepositoryError::Conflict("batch (recipe)".to_string()));
        }
        let now = Utc::now();
        let batch = Batch {
            id: BatchId::new(next_id(&mut self.working.sequences.batch)),
            code: batch.code.clone(),
            recipe_id: batch.recipe_id,
            status: BatchStatus::Planned,
            planned_units: batch.planned_units,
            actual_units: None,
            cost_snapshot_total: None,
            cost_snapshot_per_unit: None,
            created_by: batch.created_by,
            created_at: now,
            updated_at: now,
        };
        self.working.batches.push(batch.clone());
        Ok(batch)
    }

    async fn get_batch(&mut self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        Ok(self.working.batches.iter().find(|b| b.id == id).cloned())
    }

    async fn list_batches(&mut self, filter: &BatchFilter) -> Result<Vec<Batch>, RepositoryError> {
        let mut rows: Vec<&Batch> = self
            .working
            .batches
            .iter()
            .filter(|b| filter.status.is_none_or(|status| b.status == status))
            .filter(|b| filter.recipe_id.is_none_or(|id| b.recipe_id == id))
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(page(rows.into_iter().cloned(), filter.limit, filter.offset))
    }

    async fn set_batch_status(
        &mut self,
        id: BatchId,
        status: BatchStatus,
    ) -> Result<Option<Batch>, RepositoryError> {
        let Some(batch) = self.working.batches.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        batch.status = status;
        batch.updated_at = Utc::now();
        Ok(Some(batch.clone()))
    }

    async fn mark_batch_produced(
        &mut self,
        id: BatchId,
        snapshot: &CostSnapshot,
    ) -> Result<Option<Batch>, RepositoryError> {
        let Some(batch) = self.working.batches.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        batch.status = BatchStatus::Produced;
        batch.actual_units = Some(snapshot.actual_units);
        batch.cost_snapshot_total = Some(snapshot.total);
        batch.cost_snapshot_per_unit = Some(snapshot.per_unit);
        batch.updated_at = Utc::now();
        Ok(Some(batch.clone()))
    }

    async fn insert_consumption(
        &mut self,
        batch_id: BatchId,
        consumption: &NewConsumption,
    ) -> Result<BatchConsumption, RepositoryError> {
        let tables = &mut self.working;
        if !tables.batches.iter().any(|b| b.id == batch_id)
            || !tables.ingredient_exists(consumption.ingredient_id)
        {
            return Err(RepositoryError::Conflict(
                "batch consumption (foreign key)".to_string(),
            ));
        }
        if tables
            .consumptions
            .iter()
            .any(|c| c.batch_id == batch_id && c.ingredient_id == consumption.ingredient_id)
        {
            return Err(RepositoryError::Conflict(
                "batch consumption (batch_consumption_batch_ingredient_key)".to_string(),
            ));
        }
        let row = BatchConsumption {
            id: BatchConsumptionId::new(next_id(&mut tables.sequences.consumption)),
            batch_id,
            ingredient_id: consumption.ingredient_id,
            quantity_used: consumption.quantity_used,
            unit_cost_at_time: consumption.unit_cost_at_time,
        };
        tables.consumptions.push(row.clone());
        Ok(row)
    }

    async fn list_consumptions(
        &mut self,
        batch_id: BatchId,
    ) -> Result<Vec<BatchConsumption>, RepositoryError> {
        Ok(self
            .working
            .consumptions
            .iter()
            .filter(|c| c.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
