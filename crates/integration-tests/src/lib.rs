//! Integration tests for the solid-ops backend.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios (no database needed)
//! cargo test -p solid-ops-integration-tests
//!
//! # Include the PostgreSQL suite
//! OPS_TEST_DATABASE_URL=postgres://localhost/ops_test \
//!     cargo test -p solid-ops-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `ledger` - Movement ledger and balances
//! - `production` - Recipe costing and batch production workflows
//! - `postgres` - The same workflows against a migrated database
//!
//! The helpers below work against any [`Store`], so each workflow can run
//! on both [`MemoryStore`] and [`PgStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use rust_decimal::Decimal;
use secrecy::SecretString;

use solid_ops::config::DatabaseConfig;
use solid_ops::db::{self, MemoryStore, PgStore, Store};
use solid_ops::error::OpsError;
use solid_ops::models::{
    CreateIngredientInput, CreateRecipeInput, RecipeItemInput, RecordMovementInput,
};
use solid_ops::services::{IngredientService, InventoryService, RecipeService};
use solid_ops_core::{IngredientId, MovementType, RecipeId, Unit, UserId};

/// Actor recorded on every movement and batch created by the tests.
pub const TEST_ACTOR: UserId = UserId::new(42);

/// Environment variable naming the database for the `PostgreSQL` suite.
pub const TEST_DATABASE_ENV: &str = "OPS_TEST_DATABASE_URL";

/// Fresh in-memory store.
#[must_use]
pub fn memory_store() -> MemoryStore {
    MemoryStore::new()
}

/// Connect to the test database and apply migrations.
///
/// Returns `None` when [`TEST_DATABASE_ENV`] is unset.
///
/// # Errors
///
/// Returns `sqlx::Error` if the pool or a migration fails.
pub async fn postgres_store() -> Result<Option<PgStore>, sqlx::Error> {
    let Ok(url) = std::env::var(TEST_DATABASE_ENV) else {
        return Ok(None);
    };
    let pool = db::create_pool(&DatabaseConfig::with_url(SecretString::from(url))).await?;
    solid_ops::MIGRATOR.run(&pool).await?;
    Ok(Some(PgStore::new(pool)))
}

/// Register an ingredient.
///
/// # Errors
///
/// Propagates service errors.
pub async fn ingredient<St: Store>(
    store: &St,
    name: &str,
    unit: Unit,
    cost_per_unit: Decimal,
) -> Result<IngredientId, OpsError> {
    let ingredient = IngredientService::new(store)
        .create(&CreateIngredientInput {
            name: name.to_string(),
            unit,
            cost_per_unit,
            supplier_name: None,
        })
        .await?;
    Ok(ingredient.id)
}

/// Receive stock of an ingredient.
///
/// # Errors
///
/// Propagates ledger errors.
pub async fn receive<St: Store>(
    store: &St,
    ingredient_id: IngredientId,
    quantity: Decimal,
    unit_cost: Decimal,
) -> Result<(), OpsError> {
    InventoryService::new(store)
        .record_movement(
            &RecordMovementInput {
                ingredient_id,
                movement_type: MovementType::In,
                quantity,
                unit_cost_at_time: Some(unit_cost),
                note: Some("Supplier delivery".to_string()),
            },
            TEST_ACTOR,
        )
        .await?;
    Ok(())
}

/// Create a recipe from `(ingredient, quantity, waste_factor)` lines.
///
/// # Errors
///
/// Propagates service errors.
pub async fn recipe<St: Store>(
    store: &St,
    name: &str,
    yield_quantity: Decimal,
    lines: &[(IngredientId, Decimal, Decimal)],
) -> Result<RecipeId, OpsError> {
    let items = lines
        .iter()
        .map(|&(ingredient_id, quantity, waste_factor)| RecipeItemInput {
            ingredient_id,
            quantity,
            waste_factor,
        })
        .collect();

    let detail = RecipeService::new(store)
        .create(&CreateRecipeInput {
            name: name.to_string(),
            yield_quantity,
            yield_unit: Unit::Count,
            notes: None,
            items,
        })
        .await?;
    Ok(detail.recipe.id)
}

/// Current balance of an ingredient.
///
/// # Errors
///
/// Propagates storage errors.
pub async fn balance<St: Store>(
    store: &St,
    ingredient_id: IngredientId,
) -> Result<Decimal, OpsError> {
    InventoryService::new(store).get_balance(ingredient_id).await
}
