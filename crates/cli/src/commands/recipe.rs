//! Recipe commands.
//!
//! # Usage
//!
//! ```bash
//! solid-ops recipe create --file recipes/shampoo-bar.yaml
//! solid-ops recipe add-item 2 --ingredient 3 --quantity 250 --waste 0.05
//! solid-ops recipe remove-item 2 --ingredient 3
//! solid-ops recipe show 2
//! solid-ops recipe cost 2
//! ```
//!
//! # Recipe file
//!
//! Decimals are quoted so they keep their exact value:
//!
//! ```yaml
//! name: Shampoo bar
//! yield_quantity: "10"
//! yield_unit: un
//! notes: Cold process, cure 4 weeks
//! items:
//!   - ingredient_id: 3
//!     quantity: "250"
//!     waste_factor: "0.05"
//!   - ingredient_id: 5
//!     quantity: "40"
//! ```

use std::path::Path;

use clap::Subcommand;
use rust_decimal::Decimal;

use solid_ops::db::Store;
use solid_ops::models::{CreateRecipeInput, RecipeItemInput, UpdateRecipeInput};
use solid_ops::services::RecipeService;
use solid_ops_core::{IngredientId, RecipeId, Unit};

use super::{CommandError, print_json};

#[derive(Subcommand)]
pub enum RecipeAction {
    /// Create a recipe with its items from a YAML file
    Create {
        #[arg(short, long)]
        file: String,
    },
    /// Show a recipe and its items
    Show { id: i32 },
    /// List recipes
    List {
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        #[arg(short, long, default_value_t = 0)]
        offset: i64,
    },
    /// Rename or change yield and notes
    Update {
        id: i32,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        yield_quantity: Option<Decimal>,

        #[arg(short = 'u', long)]
        yield_unit: Option<Unit>,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Add an item, or overwrite the existing item for that ingredient
    AddItem {
        recipe: i32,

        #[arg(short, long)]
        ingredient: i32,

        #[arg(short, long)]
        quantity: Decimal,

        #[arg(short, long, default_value = "0")]
        waste: Decimal,
    },
    /// Remove the item for an ingredient
    RemoveItem {
        recipe: i32,

        #[arg(short, long)]
        ingredient: i32,
    },
    /// Cost sheet at current ingredient costs
    Cost { id: i32 },
}

fn load_recipe_file(path: &str) -> Result<CreateRecipeInput, CommandError> {
    let contents = std::fs::read_to_string(Path::new(path)).map_err(|source| CommandError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Run a recipe command.
///
/// # Errors
///
/// Returns `CommandError::Ops` if the service rejects the request, or
/// `Io`/`Yaml` if the recipe file cannot be loaded.
pub async fn run<St: Store>(store: &St, action: RecipeAction) -> Result<(), CommandError> {
    let service = RecipeService::new(store);

    match action {
        RecipeAction::Create { file } => {
            let input = load_recipe_file(&file)?;
            print_json(&service.create(&input).await?)
        }
        RecipeAction::Show { id } => print_json(&service.get(RecipeId::new(id)).await?),
        RecipeAction::List { limit, offset } => {
            print_json(&service.list(Some(limit), Some(offset)).await?)
        }
        RecipeAction::Update {
            id,
            name,
            yield_quantity,
            yield_unit,
            notes,
        } => {
            let recipe = service
                .update(
                    RecipeId::new(id),
                    &UpdateRecipeInput {
                        name,
                        yield_quantity,
                        yield_unit,
                        notes,
                    },
                )
                .await?;
            print_json(&recipe)
        }
        RecipeAction::AddItem {
            recipe,
            ingredient,
            quantity,
            waste,
        } => {
            let item = service
                .upsert_item(
                    RecipeId::new(recipe),
                    &RecipeItemInput {
                        ingredient_id: IngredientId::new(ingredient),
                        quantity,
                        waste_factor: waste,
                    },
                )
                .await?;
            print_json(&item)
        }
        RecipeAction::RemoveItem { recipe, ingredient } => {
            service
                .remove_item(RecipeId::new(recipe), IngredientId::new(ingredient))
                .await?;
            print_json(&serde_json::json!({ "removed": true }))
        }
        RecipeAction::Cost { id } => print_json(&service.calculate_cost(RecipeId::new(id)).await?),
    }
}
