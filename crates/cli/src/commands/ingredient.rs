//! Ingredient catalog commands.
//!
//! # Usage
//!
//! ```bash
//! solid-ops ingredient add --name "Shea butter" --unit g --cost 0.04
//! solid-ops ingredient list --all
//! solid-ops ingredient update 3 --cost 0.05
//! solid-ops ingredient deactivate 3
//! ```

use clap::Subcommand;
use rust_decimal::Decimal;

use solid_ops::db::Store;
use solid_ops::models::{CreateIngredientInput, UpdateIngredientInput};
use solid_ops::services::IngredientService;
use solid_ops_core::{IngredientId, Unit};

use super::{CommandError, print_json};

#[derive(Subcommand)]
pub enum IngredientAction {
    /// Register a new ingredient
    Add {
        #[arg(short, long)]
        name: String,

        /// Stock unit (`g`, `ml`, `un`)
        #[arg(short, long)]
        unit: Unit,

        /// Current cost per unit
        #[arg(short, long, default_value = "0")]
        cost: Decimal,

        #[arg(short, long)]
        supplier: Option<String>,
    },
    /// Show one ingredient
    Show { id: i32 },
    /// List ingredients
    List {
        /// Include deactivated ingredients
        #[arg(long)]
        all: bool,
    },
    /// Change name, unit, cost or supplier
    Update {
        id: i32,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        unit: Option<Unit>,

        #[arg(short, long)]
        cost: Option<Decimal>,

        #[arg(short, long)]
        supplier: Option<String>,
    },
    /// Soft-delete an ingredient
    Deactivate { id: i32 },
}

/// Run an ingredient command.
///
/// # Errors
///
/// Returns `CommandError::Ops` if the service rejects the request.
pub async fn run<St: Store>(store: &St, action: IngredientAction) -> Result<(), CommandError> {
    let service = IngredientService::new(store);

    match action {
        IngredientAction::Add {
            name,
            unit,
            cost,
            supplier,
        } => {
            let ingredient = service
                .create(&CreateIngredientInput {
                    name,
                    unit,
                    cost_per_unit: cost,
                    supplier_name: supplier,
                })
                .await?;
            print_json(&ingredient)
        }
        IngredientAction::Show { id } => print_json(&service.get(IngredientId::new(id)).await?),
        IngredientAction::List { all } => print_json(&service.list(!all).await?),
        IngredientAction::Update {
            id,
            name,
            unit,
            cost,
            supplier,
        } => {
            let ingredient = service
                .update(
                    IngredientId::new(id),
                    &UpdateIngredientInput {
                        name,
                        unit,
                        cost_per_unit: cost,
                        supplier_name: supplier,
                        active: None,
                    },
                )
                .await?;
            print_json(&ingredient)
        }
        IngredientAction::Deactivate { id } => {
            print_json(&service.deactivate(IngredientId::new(id)).await?)
        }
    }
}
