//! Stock ledger commands.
//!
//! # Usage
//!
//! ```bash
//! # Receive 1000 g at 0.04 per gram
//! solid-ops stock in 3 1000 --cost 0.04 --note "Invoice 118"
//!
//! # Manual consumption
//! solid-ops stock out 3 50
//!
//! # Signed correction after a count
//! solid-ops stock adjust 3 -12 --cost 0.04
//!
//! solid-ops stock balance 3
//! solid-ops stock balances
//! solid-ops stock history --ingredient 3 --limit 20
//! ```

use chrono::{DateTime, Utc};
use clap::Subcommand;
use rust_decimal::Decimal;

use solid_ops::db::Store;
use solid_ops::models::{MovementFilter, RecordMovementInput};
use solid_ops::services::InventoryService;
use solid_ops_core::{IngredientId, MovementType, UserId};

use super::{CommandError, print_json};

#[derive(Subcommand)]
pub enum StockAction {
    /// Record received stock
    In {
        ingredient: i32,
        quantity: Decimal,

        /// Unit cost paid
        #[arg(short, long)]
        cost: Option<Decimal>,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Record consumed stock
    Out {
        ingredient: i32,
        quantity: Decimal,

        #[arg(short, long)]
        cost: Option<Decimal>,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Record a signed correction
    Adjust {
        ingredient: i32,

        #[arg(allow_hyphen_values = true)]
        quantity: Decimal,

        #[arg(short, long)]
        cost: Option<Decimal>,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Current balance of one ingredient
    Balance { ingredient: i32 },
    /// Current balance of every active ingredient
    Balances,
    /// Ledger entries, newest first
    History {
        #[arg(short, long)]
        ingredient: Option<i32>,

        /// Only entries at or after this RFC 3339 timestamp
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Only entries at or before this RFC 3339 timestamp
        #[arg(long)]
        to: Option<DateTime<Utc>>,

        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        #[arg(short, long, default_value_t = 0)]
        offset: i64,
    },
}

fn movement(
    ingredient: i32,
    movement_type: MovementType,
    quantity: Decimal,
    cost: Option<Decimal>,
    note: Option<String>,
) -> RecordMovementInput {
    RecordMovementInput {
        ingredient_id: IngredientId::new(ingredient),
        movement_type,
        quantity,
        unit_cost_at_time: cost,
        note,
    }
}

/// Run a stock command.
///
/// # Errors
///
/// Returns `CommandError::Ops` if the ledger rejects the movement.
pub async fn run<St: Store>(
    store: &St,
    action: StockAction,
    actor: UserId,
) -> Result<(), CommandError> {
    let service = InventoryService::new(store);

    let input = match action {
        StockAction::In {
            ingredient,
            quantity,
            cost,
            note,
        } => movement(ingredient, MovementType::In, quantity, cost, note),
        StockAction::Out {
            ingredient,
            quantity,
            cost,
            note,
        } => movement(ingredient, MovementType::Out, quantity, cost, note),
        StockAction::Adjust {
            ingredient,
            quantity,
            cost,
            note,
        } => movement(ingredient, MovementType::Adjust, quantity, cost, note),
        StockAction::Balance { ingredient } => {
            let balance = service
                .ingredient_balance(IngredientId::new(ingredient))
                .await?;
            return print_json(&balance);
        }
        StockAction::Balances => return print_json(&service.balances().await?),
        StockAction::History {
            ingredient,
            from,
            to,
            limit,
            offset,
        } => {
            let filter = MovementFilter {
                ingredient_id: ingredient.map(IngredientId::new),
                start: from,
                end: to,
                limit: Some(limit),
                offset: Some(offset),
            };
            return print_json(&service.movements(&filter).await?);
        }
    };

    print_json(&service.record_movement(&input, actor).await?)
}
