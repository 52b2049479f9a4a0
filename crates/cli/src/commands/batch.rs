//! Production batch commands.
//!
//! # Usage
//!
//! ```bash
//! solid-ops batch plan --recipe 2 --units 40
//! solid-ops batch produce 7 --actual 38
//! solid-ops batch cancel 8
//! solid-ops batch show 7
//! solid-ops batch list --status PLANNED
//! ```

use clap::Subcommand;
use rust_decimal::Decimal;

use solid_ops::db::Store;
use solid_ops::models::{BatchFilter, CreateBatchInput, ProduceBatchInput};
use solid_ops::services::BatchService;
use solid_ops_core::{BatchId, BatchStatus, RecipeId, UserId};

use super::{CommandError, print_json};

#[derive(Subcommand)]
pub enum BatchAction {
    /// Plan a batch (no stock is reserved)
    Plan {
        #[arg(short, long)]
        recipe: i32,

        #[arg(short, long)]
        units: Decimal,
    },
    /// Produce a planned batch, consuming stock
    Produce {
        id: i32,

        /// Units actually produced (defaults to the planned units)
        #[arg(short, long)]
        actual: Option<Decimal>,
    },
    /// Cancel a planned batch
    Cancel { id: i32 },
    /// Show a batch and its consumptions
    Show { id: i32 },
    /// List batches, newest first
    List {
        /// `PLANNED`, `PRODUCED` or `CANCELED`
        #[arg(short, long)]
        status: Option<BatchStatus>,

        #[arg(short, long)]
        recipe: Option<i32>,

        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        #[arg(short, long, default_value_t = 0)]
        offset: i64,
    },
}

/// Run a batch command.
///
/// # Errors
///
/// Returns `CommandError::Ops` if the service rejects the request.
pub async fn run<St: Store>(
    store: &St,
    action: BatchAction,
    actor: UserId,
) -> Result<(), CommandError> {
    let service = BatchService::new(store);

    match action {
        BatchAction::Plan { recipe, units } => {
            let batch = service
                .create(
                    &CreateBatchInput {
                        recipe_id: RecipeId::new(recipe),
                        planned_units: units,
                    },
                    actor,
                )
                .await?;
            print_json(&batch)
        }
        BatchAction::Produce { id, actual } => {
            let batch = service
                .produce(
                    BatchId::new(id),
                    &ProduceBatchInput {
                        actual_units: actual,
                    },
                    actor,
                )
                .await?;
            print_json(&batch)
        }
        BatchAction::Cancel { id } => print_json(&service.cancel(BatchId::new(id)).await?),
        BatchAction::Show { id } => print_json(&service.get(BatchId::new(id)).await?),
        BatchAction::List {
            status,
            recipe,
            limit,
            offset,
        } => {
            let filter = BatchFilter {
                status,
                recipe_id: recipe.map(RecipeId::new),
                limit: Some(limit),
                offset: Some(offset),
            };
            print_json(&service.list(&filter).await?)
        }
    }
}
